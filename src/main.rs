//! Command-line interface for kafka-datagen
//!
//! # Usage Examples
//!
//! ```bash
//! # Produce the default 10 events
//! kafka-datagen
//!
//! # Keyed, deterministic run with topic bootstrap
//! kafka-datagen --topic input_topic --create-topic --partitions 3 \
//!   --count 500 --seed 42 --key-by-id
//!
//! # Everything can come from the environment
//! KAFKA_BOOTSTRAP_SERVERS=broker:9092 \
//! SCHEMA_REGISTRY_URL=http://registry:8081 \
//! RUST_LOG=debug kafka-datagen
//! ```

use clap::Parser;
use kafka_datagen::{run_producer, ProducerArgs};

#[derive(Parser)]
#[command(name = "kafka-datagen")]
#[command(about = "Produce schema-validated synthetic events to a Kafka topic")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    args: ProducerArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let summary = run_producer(cli.args).await?;
    summary.log();

    Ok(())
}
