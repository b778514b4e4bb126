//! Command-line configuration.
//!
//! Every option can also be set from the environment. The argument structs
//! are converted into the plain config structs of the component crates.

mod duration;

pub use duration::parse_duration;

use anyhow::Context;
use clap::{Args, ValueEnum};
use kafka_producer::{BrokerConfig, QueueConfig, RetryPolicy, SaslMechanism, SecurityProtocol};
use schema_registry::{RegistryConfig, SchemaDescriptor, SerializerConfig, SubjectNameStrategy};
use std::path::PathBuf;
use std::time::Duration;

/// Kafka connection options.
#[derive(Args, Clone)]
pub struct KafkaArgs {
    /// Kafka bootstrap servers (comma-separated, e.g., "localhost:9092")
    #[arg(
        long,
        env = "KAFKA_BOOTSTRAP_SERVERS",
        default_value = "localhost:9092",
        value_delimiter = ','
    )]
    pub bootstrap_servers: Vec<String>,

    /// Security protocol for broker connections
    #[arg(
        long,
        env = "KAFKA_SECURITY_PROTOCOL",
        value_enum,
        default_value_t = SecurityProtocol::Plaintext
    )]
    pub security_protocol: SecurityProtocol,

    /// SASL mechanism (required with SASL_PLAINTEXT and SASL_SSL)
    #[arg(long, env = "KAFKA_SASL_MECHANISM", value_enum)]
    pub sasl_mechanism: Option<SaslMechanism>,

    /// SASL username, or the OAuth client id for OAUTHBEARER
    #[arg(long, env = "KAFKA_SASL_USERNAME")]
    pub sasl_username: Option<String>,

    /// SASL password, or the OAuth client secret for OAUTHBEARER
    #[arg(long, env = "KAFKA_SASL_PASSWORD", hide_env_values = true)]
    pub sasl_password: Option<String>,

    /// OIDC token endpoint for OAUTHBEARER
    #[arg(long, env = "KAFKA_OAUTH_TOKEN_ENDPOINT")]
    pub oauth_token_endpoint: Option<String>,

    /// OAuth scope for OAUTHBEARER
    #[arg(long, env = "KAFKA_OAUTH_SCOPE")]
    pub oauth_scope: Option<String>,

    /// Maximum time the client spends on one delivery attempt (e.g., "5s").
    /// Keep (max retries + 1) attempts within the flush timeout.
    #[arg(long, env = "KAFKA_MESSAGE_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    pub message_timeout: Duration,

    /// Additional librdkafka producer property (KEY=VALUE, repeatable)
    #[arg(long = "producer-property", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub producer_properties: Vec<(String, String)>,

    /// Create the topic if it does not exist
    #[arg(long, env = "KAFKA_CREATE_TOPIC")]
    pub create_topic: bool,

    /// Partition count used when creating the topic
    #[arg(long, default_value = "1")]
    pub partitions: i32,

    /// Replication factor used when creating the topic
    #[arg(long, default_value = "1")]
    pub replication_factor: i32,
}

impl KafkaArgs {
    pub fn broker_config(&self) -> BrokerConfig {
        let mut config = BrokerConfig::new(
            self.bootstrap_servers
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty()),
        );
        config.security_protocol = self.security_protocol;
        config.sasl_mechanism = self.sasl_mechanism;
        config.username = self.sasl_username.clone();
        config.password = self.sasl_password.clone();
        config.oauth_token_endpoint = self.oauth_token_endpoint.clone();
        config.oauth_scope = self.oauth_scope.clone();
        config.message_timeout = self.message_timeout;
        config.extra_properties = self.producer_properties.clone();
        config
    }
}

/// How registry subjects are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SubjectStrategy {
    /// `<topic>-value`
    #[default]
    TopicName,
    /// The schema title
    RecordName,
    /// `<topic>-<schema title>`
    TopicRecordName,
}

/// Schema registry options.
#[derive(Args, Clone)]
pub struct RegistryArgs {
    /// Schema registry URL
    #[arg(
        long,
        env = "SCHEMA_REGISTRY_URL",
        default_value = "http://localhost:8081"
    )]
    pub schema_registry_url: String,

    /// Schema registry basic auth credentials ("user:secret")
    #[arg(
        long,
        env = "SCHEMA_REGISTRY_BASIC_AUTH_USER_INFO",
        hide_env_values = true
    )]
    pub schema_registry_basic_auth: Option<String>,

    /// Timeout for schema registry requests
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub schema_registry_timeout: Duration,

    /// Path to the JSON Schema file
    #[arg(
        long,
        env = "SCHEMA_FILE",
        default_value = "schemas/input-topic_schema.json"
    )]
    pub schema_file: PathBuf,

    /// Subject naming strategy
    #[arg(long, value_enum, default_value_t = SubjectStrategy::TopicName)]
    pub subject_name_strategy: SubjectStrategy,

    /// Require the schema to be registered already instead of registering it
    #[arg(long)]
    pub no_auto_register: bool,

    /// Use the latest schema version registered under the subject
    #[arg(long, conflicts_with = "no_auto_register")]
    pub use_latest_version: bool,
}

impl RegistryArgs {
    pub fn registry_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(self.schema_registry_url.clone())
            .with_timeout(self.schema_registry_timeout);
        if let Some(user_info) = &self.schema_registry_basic_auth {
            config = config.with_basic_auth(user_info.clone());
        }
        config
    }

    /// Serializer settings. Record-name strategies take the record name from
    /// the schema title.
    pub fn serializer_config(&self, schema: &SchemaDescriptor) -> anyhow::Result<SerializerConfig> {
        let record_name = || {
            schema
                .title()
                .map(str::to_string)
                .context("Schema has no title to use as the record name")
        };

        let subject_name_strategy = match self.subject_name_strategy {
            SubjectStrategy::TopicName => SubjectNameStrategy::TopicName,
            SubjectStrategy::RecordName => SubjectNameStrategy::RecordName(record_name()?),
            SubjectStrategy::TopicRecordName => {
                SubjectNameStrategy::TopicRecordName(record_name()?)
            }
        };

        Ok(SerializerConfig {
            auto_register_schemas: !self.no_auto_register && !self.use_latest_version,
            use_latest_version: self.use_latest_version,
            subject_name_strategy,
        })
    }
}

/// Publish queue tuning.
#[derive(Args, Clone, Debug)]
pub struct QueueArgs {
    /// Messages buffered locally before publishing waits for space
    #[arg(long, default_value = "10000")]
    pub queue_capacity: usize,

    /// How long to wait for buffer space before dropping a message
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub enqueue_timeout: Duration,

    /// Maximum messages per batch
    #[arg(long, default_value = "100")]
    pub batch_size: usize,

    /// How long to wait to fill a batch (e.g., "5ms")
    #[arg(long, default_value = "5ms", value_parser = parse_duration)]
    pub linger: Duration,

    /// Maximum batches transmitted concurrently (1 keeps per-key ordering)
    #[arg(long, default_value = "5")]
    pub max_in_flight: usize,

    /// Retries for retriable delivery failures
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Initial retry backoff, doubled on each retry
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub retry_backoff: Duration,

    /// Upper bound for the retry backoff
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub max_retry_backoff: Duration,
}

impl QueueArgs {
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.queue_capacity,
            enqueue_timeout: self.enqueue_timeout,
            batch_size: self.batch_size,
            linger: self.linger,
            max_in_flight: self.max_in_flight,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                initial_backoff: self.retry_backoff,
                max_backoff: self.max_retry_backoff,
            },
        }
    }
}

/// Options for one producer run.
#[derive(Args, Clone)]
pub struct ProducerArgs {
    /// Topic to publish events to
    #[arg(long, env = "KAFKA_TOPIC", default_value = "input_topic")]
    pub topic: String,

    /// Number of events to generate
    #[arg(long, short = 'n', default_value = "10")]
    pub count: u64,

    /// Random seed for deterministic generation (same seed = same events)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use the event id (field3) as the message key
    #[arg(long)]
    pub key_by_id: bool,

    /// How long to wait for outstanding deliveries before giving up
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub flush_timeout: Duration,

    #[command(flatten)]
    pub kafka: KafkaArgs,

    #[command(flatten)]
    pub registry: RegistryArgs,

    #[command(flatten)]
    pub queue: QueueArgs,
}

impl ProducerArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            topic: self.topic.clone(),
            count: self.count,
            seed: self.seed,
            key_by_id: self.key_by_id,
            flush_timeout: self.flush_timeout,
        }
    }
}

/// What to produce, independent of where it goes.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub topic: String,
    pub count: u64,
    pub seed: Option<u64>,
    pub key_by_id: bool,
    pub flush_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            topic: "input_topic".to_string(),
            count: 10,
            seed: None,
            key_by_id: false,
            flush_timeout: Duration::from_secs(30),
        }
    }
}

/// Parse a `KEY=VALUE` pair.
fn parse_key_value(s: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Empty property name in '{s}'");
    }
    Ok((key.to_string(), value.to_string()))
}
