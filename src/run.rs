//! Producer run: generate, validate, publish, drain.

use crate::config::{ProducerArgs, RegistryArgs, RunOptions};
use crate::logging::{mask_connection_password, mask_user_info};
use anyhow::Context;
use bytes::Bytes;
use event_generator::EventGenerator;
use kafka_producer::{
    create_topic_if_not_exists, DeliveryOutcome, KafkaTransport, PublishError, PublishQueue,
    QueueConfig, Transport,
};
use schema_registry::{
    JsonSchemaSerializer, SchemaDescriptor, SchemaRegistryClient, SerializationContext,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Counts of what happened to the events of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Events produced by the generator
    pub generated: u64,
    /// Events rejected by schema validation
    pub rejected: u64,
    /// Events dropped because the publish queue stayed full
    pub dropped: u64,
    /// Events accepted by the publish queue
    pub enqueued: u64,
    /// Events acknowledged by the broker
    pub delivered: u64,
    /// Events whose delivery failed terminally
    pub failed: u64,
    /// Events still unresolved when the flush timeout passed
    pub outstanding: usize,
    pub total_duration: Duration,
}

impl RunSummary {
    /// Calculate delivered messages per second.
    pub fn messages_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.delivered as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!(
            "Produced {} of {} events in {:?} ({:.0} msgs/sec)",
            self.delivered,
            self.generated,
            self.total_duration,
            self.messages_per_second()
        );
        if self.rejected > 0 {
            warn!("{} event(s) failed schema validation", self.rejected);
        }
        if self.dropped > 0 {
            warn!("{} event(s) dropped because the queue was full", self.dropped);
        }
        if self.failed > 0 {
            warn!("{} event(s) failed delivery", self.failed);
        }
    }
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Run the producer against Kafka and the schema registry configured in
/// `args`.
pub async fn run_producer(args: ProducerArgs) -> anyhow::Result<RunSummary> {
    let broker = args.kafka.broker_config();
    // Validate broker settings before touching the registry
    broker
        .client_config()
        .context("Invalid Kafka configuration")?;

    let serializer = prepare_serializer(&args.registry, &args.topic).await?;

    info!(
        "Connecting to Kafka at {} ({})",
        broker.bootstrap_servers_string(),
        broker.security_protocol.as_config_value()
    );

    if args.kafka.create_topic {
        create_topic_if_not_exists(
            &broker,
            &args.topic,
            args.kafka.partitions,
            args.kafka.replication_factor,
        )
        .await
        .with_context(|| format!("Failed to create topic '{}'", args.topic))?;
    }

    let transport = KafkaTransport::new(&broker).context("Failed to create Kafka producer")?;

    produce(
        &args.run_options(),
        &serializer,
        Arc::new(transport),
        args.queue.queue_config(),
    )
    .await
}

/// Load the schema file and resolve its registry id for `topic`.
pub async fn prepare_serializer(
    args: &RegistryArgs,
    topic: &str,
) -> anyhow::Result<JsonSchemaSerializer> {
    let schema = SchemaDescriptor::from_file(&args.schema_file)
        .with_context(|| format!("Failed to load schema from {:?}", args.schema_file))?;
    let config = args.serializer_config(&schema)?;

    let client = SchemaRegistryClient::new(args.registry_config())
        .context("Invalid schema registry configuration")?;
    info!(
        "Using schema registry at {}{}",
        mask_connection_password(client.base_url()),
        args.schema_registry_basic_auth
            .as_deref()
            .map(|user_info| format!(" as {}", mask_user_info(user_info)))
            .unwrap_or_default()
    );

    JsonSchemaSerializer::configure(
        schema,
        &client,
        config,
        &[SerializationContext::value(topic)],
    )
    .await
    .context("Failed to resolve schema with the registry")
}

/// Generate `options.count` events, publish them through `transport` and
/// wait for every delivery to resolve.
///
/// Fails if messages are still outstanding after the flush timeout.
pub async fn produce(
    options: &RunOptions,
    serializer: &JsonSchemaSerializer,
    transport: Arc<dyn Transport>,
    queue_config: QueueConfig,
) -> anyhow::Result<RunSummary> {
    let queue =
        PublishQueue::new(transport, queue_config).context("Failed to start publish queue")?;
    let counters = Arc::new(DeliveryCounters::default());
    let mut generator = match options.seed {
        Some(seed) => EventGenerator::with_seed(seed),
        None => EventGenerator::new(),
    };

    info!(
        "Producing {} events to topic '{}'",
        options.count, options.topic
    );

    let start = Instant::now();
    let mut summary = RunSummary::default();

    for record in generator.records(options.count) {
        summary.generated += 1;

        let payload = match serializer.serialize_value(&record, &options.topic) {
            Ok(payload) => payload,
            Err(e) if e.is_validation() => {
                warn!("Skipping event {}: {}", record.id(), e);
                summary.rejected += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to serialize event {}", record.id()))
            }
        };

        let key = options
            .key_by_id
            .then(|| Bytes::from(record.id().to_string()));
        let value = serde_json::to_string(&record)?;
        let counters = counters.clone();

        let result = queue
            .publish(options.topic.as_str(), key, payload, move |outcome| match outcome {
                DeliveryOutcome::Success(report) => {
                    counters.delivered.fetch_add(1, Ordering::Relaxed);
                    info!("Produced event to topic {}: value = {}", report, value);
                }
                DeliveryOutcome::Failure(err) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    error!("Failed to deliver event: {} (value = {})", err, value);
                }
            })
            .await;

        match result {
            Ok(()) => summary.enqueued += 1,
            Err(e @ PublishError::QueueFull { .. }) => {
                warn!("Dropping event {}: {}", record.id(), e);
                summary.dropped += 1;
            }
            Err(e) => return Err(e).context("Failed to enqueue event"),
        }
    }

    let outstanding = queue.flush(options.flush_timeout).await;
    let outstanding = if outstanding == 0 {
        queue.shutdown(options.flush_timeout).await
    } else {
        outstanding
    };

    summary.delivered = counters.delivered.load(Ordering::Relaxed);
    summary.failed = counters.failed.load(Ordering::Relaxed);
    summary.outstanding = outstanding;
    summary.total_duration = start.elapsed();

    if outstanding > 0 {
        anyhow::bail!(
            "{} message(s) still outstanding after waiting {:?} for delivery",
            outstanding,
            options.flush_timeout
        );
    }

    Ok(summary)
}
