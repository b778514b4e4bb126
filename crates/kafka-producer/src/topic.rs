//! Topic bootstrap through the Kafka admin API.

use crate::config::BrokerConfig;
use crate::error::PublishError;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use std::time::Duration;
use tracing::info;

/// Create `topic` with the given layout. An existing topic is left as it is,
/// whatever its layout.
pub async fn create_topic_if_not_exists(
    config: &BrokerConfig,
    topic: &str,
    partitions: i32,
    replication: i32,
) -> Result<(), PublishError> {
    if partitions < 1 || replication < 1 {
        return Err(PublishError::Configuration(format!(
            "topic '{topic}' needs at least one partition and one replica \
             (got {partitions} partitions, replication {replication})"
        )));
    }

    let admin_client: AdminClient<DefaultClientContext> = config.client_config()?.create()?;
    let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(replication));
    let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(10)));

    let results = admin_client
        .create_topics(&[new_topic], &opts)
        .await
        .map_err(|e| PublishError::TopicCreation(format!("admin request failed: {e}")))?;

    for result in results {
        match result {
            Ok(name) => info!(
                "Topic '{}' created with {} partition(s), replication {}",
                name, partitions, replication
            ),
            Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                info!("Topic '{}' already exists", name)
            }
            Err((name, code)) => {
                return Err(PublishError::TopicCreation(format!(
                    "failed to create topic '{name}': {code}"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_empty_layout_before_connecting() {
        let config = BrokerConfig::new(["localhost:9092"]);
        let result = create_topic_if_not_exists(&config, "input_topic", 0, 1).await;
        assert!(matches!(result, Err(PublishError::Configuration(_))));
    }
}
