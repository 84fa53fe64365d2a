//! `tidings publish`: one message, or a simulated sensor feed.

use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::cli::PublishArgs;
use crate::client::BrokerClient;

/// A fake temperature/humidity reading, two decimals each.
#[must_use]
pub fn sensor_reading<R: Rng>(rng: &mut R) -> String {
    let temperature: f64 = rng.random_range(20.0..=30.0);
    let humidity: f64 = rng.random_range(40.0..=70.0);
    format!("temp:{temperature:.2},humidity:{humidity:.2}")
}

/// Publishes `--message` once, or a sensor reading every `--interval`
/// seconds until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the single message is
/// refused. Failures during the simulation are logged and skipped.
pub async fn run(args: PublishArgs) -> anyhow::Result<()> {
    let client = BrokerClient::new(&args.broker, &args.id, super::CLIENT_TIMEOUT)?;

    if let Some(message) = &args.message {
        let ack = client.publish(&args.topic, message).await?;
        println!("Published to '{}' at {}: {message}", ack.topic, ack.timestamp);
        return Ok(());
    }

    info!(
        topic = %args.topic,
        interval_secs = args.interval,
        "starting sensor simulation"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    let stop = super::ctrl_c();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            () = &mut stop => break,
            _ = ticker.tick() => {}
        }

        let payload = sensor_reading(&mut rand::rng());
        match client.publish(&args.topic, &payload).await {
            Ok(_) => println!("Published to '{}': {payload}", args.topic),
            // A broker outage should not end the simulation.
            Err(e) => warn!(error = %e, topic = %args.topic, "publish failed"),
        }
    }

    info!("sensor simulation stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn parse_field(reading: &str, name: &str) -> f64 {
        reading
            .split(',')
            .find_map(|part| part.strip_prefix(name)?.strip_prefix(':'))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn readings_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let reading = sensor_reading(&mut rng);
            let temperature = parse_field(&reading, "temp");
            let humidity = parse_field(&reading, "humidity");
            assert!((20.0..=30.0).contains(&temperature), "{reading}");
            assert!((40.0..=70.0).contains(&humidity), "{reading}");
        }
    }

    #[test]
    fn readings_use_two_decimals() {
        let reading = sensor_reading(&mut StdRng::seed_from_u64(1));
        for part in reading.split(',') {
            let (_, value) = part.split_once(':').unwrap();
            let (_, decimals) = value.split_once('.').unwrap();
            assert_eq!(decimals.len(), 2, "{reading}");
        }
    }
}
