//! `tidings clear`: drop a topic on a running broker.

use crate::cli::ClearArgs;
use crate::client::BrokerClient;

/// Clears `args.topic` and prints how many messages were discarded.
///
/// # Errors
///
/// Returns an error if the broker is unreachable or holds no such topic.
pub async fn run(args: ClearArgs) -> anyhow::Result<()> {
    let client = BrokerClient::new(&args.broker, "tidings-cli", super::CLIENT_TIMEOUT)?;
    let response = client.clear(&args.topic).await?;
    println!(
        "Cleared {} message(s) from '{}'",
        response.cleared, response.topic
    );
    Ok(())
}
