//! `tidings subscribe`: poll a topic and print what arrives.

use std::io::Write;
use std::time::Duration;

use tidings_core::Message;
use tracing::{info, warn};

use crate::cli::SubscribeArgs;
use crate::client::{BrokerClient, Subscription};

/// Renders one received message for the terminal.
#[must_use]
pub fn format_message(topic: &str, message: &Message) -> String {
    format!(
        "[{}] {topic}\n  From: {}\n  Data: {}\n",
        message.timestamp, message.publisher, message.payload
    )
}

/// Polls `args.topic` every `--interval` seconds until Ctrl-C.
///
/// # Errors
///
/// Returns an error only if the client cannot be built; poll failures are
/// logged and retried.
pub async fn run(args: SubscribeArgs) -> anyhow::Result<()> {
    let client = BrokerClient::new(&args.broker, "tidings-subscriber", super::CLIENT_TIMEOUT)?;
    let mut subscription = Subscription::new(client);

    info!(topic = %args.topic, interval_secs = args.interval, "subscribing");

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    let stop = super::ctrl_c();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            () = &mut stop => break,
            _ = ticker.tick() => {}
        }

        match subscription.poll(&args.topic).await {
            Ok(messages) if messages.is_empty() => {
                print!(".");
                let _ = std::io::stdout().flush();
            }
            Ok(messages) => {
                println!();
                for message in &messages {
                    println!("{}", format_message(&args.topic, message));
                }
            }
            Err(e) => warn!(error = %e, topic = %args.topic, "poll failed"),
        }
    }

    println!();
    info!("subscriber stopped");
    Ok(())
}
