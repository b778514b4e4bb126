//! Broker connection and publish queue configuration.

use crate::error::PublishError;
use clap::ValueEnum;
use rdkafka::ClientConfig;
use std::fmt;
use std::time::Duration;

/// Transport security used to talk to the brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SecurityProtocol {
    #[default]
    #[value(name = "PLAINTEXT", alias = "plaintext")]
    Plaintext,
    #[value(name = "SSL", alias = "ssl")]
    Ssl,
    #[value(name = "SASL_PLAINTEXT", alias = "sasl_plaintext")]
    SaslPlaintext,
    #[value(name = "SASL_SSL", alias = "sasl_ssl")]
    SaslSsl,
}

impl SecurityProtocol {
    pub fn as_config_value(&self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "plaintext",
            SecurityProtocol::Ssl => "ssl",
            SecurityProtocol::SaslPlaintext => "sasl_plaintext",
            SecurityProtocol::SaslSsl => "sasl_ssl",
        }
    }

    pub fn uses_sasl(&self) -> bool {
        matches!(
            self,
            SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl
        )
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SaslMechanism {
    /// Username/password sent in the clear (use with SASL_SSL)
    #[value(name = "PLAIN", alias = "plain")]
    Plain,
    #[value(name = "SCRAM-SHA-256", alias = "scram-sha-256")]
    ScramSha256,
    #[value(name = "SCRAM-SHA-512", alias = "scram-sha-512")]
    ScramSha512,
    /// OAuth bearer tokens fetched from an OIDC token endpoint
    #[value(name = "OAUTHBEARER", alias = "oauthbearer")]
    OAuthBearer,
}

impl SaslMechanism {
    pub fn as_config_value(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "PLAIN",
            SaslMechanism::ScramSha256 => "SCRAM-SHA-256",
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
            SaslMechanism::OAuthBearer => "OAUTHBEARER",
        }
    }
}

/// Configuration for the Kafka connection.
#[derive(Clone)]
pub struct BrokerConfig {
    /// Bootstrap brokers (host:port)
    pub bootstrap_servers: Vec<String>,
    pub security_protocol: SecurityProtocol,
    /// Required when the security protocol uses SASL
    pub sasl_mechanism: Option<SaslMechanism>,
    /// SASL username, or the OAuth client id for OAUTHBEARER
    pub username: Option<String>,
    /// SASL password, or the OAuth client secret for OAUTHBEARER
    pub password: Option<String>,
    /// OIDC token endpoint, required for OAUTHBEARER
    pub oauth_token_endpoint: Option<String>,
    /// Optional OAuth scope for OAUTHBEARER
    pub oauth_scope: Option<String>,
    /// How long the client may spend delivering a single message,
    /// including its own internal retries
    pub message_timeout: Duration,
    /// Additional librdkafka properties, applied last
    pub extra_properties: Vec<(String, String)>,
}

impl BrokerConfig {
    pub fn new<I, S>(bootstrap_servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bootstrap_servers: bootstrap_servers.into_iter().map(Into::into).collect(),
            security_protocol: SecurityProtocol::Plaintext,
            sasl_mechanism: None,
            username: None,
            password: None,
            oauth_token_endpoint: None,
            oauth_scope: None,
            message_timeout: Duration::from_secs(5),
            extra_properties: Vec::new(),
        }
    }

    /// SASL_SSL with username/password credentials.
    pub fn with_sasl_credentials(
        mut self,
        mechanism: SaslMechanism,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.security_protocol = SecurityProtocol::SaslSsl;
        self.sasl_mechanism = Some(mechanism);
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Comma-separated broker list, as librdkafka expects it.
    pub fn bootstrap_servers_string(&self) -> String {
        self.bootstrap_servers.join(",")
    }

    /// Build the librdkafka client configuration, validating that the
    /// authentication settings are consistent.
    pub fn client_config(&self) -> Result<ClientConfig, PublishError> {
        if self.bootstrap_servers.iter().all(|s| s.trim().is_empty()) {
            return Err(PublishError::Configuration(
                "at least one bootstrap server is required".to_string(),
            ));
        }

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.bootstrap_servers_string())
            .set("security.protocol", self.security_protocol.as_config_value())
            .set(
                "message.timeout.ms",
                self.message_timeout.as_millis().to_string(),
            );

        match (self.security_protocol.uses_sasl(), self.sasl_mechanism) {
            (true, None) => {
                return Err(PublishError::Configuration(format!(
                    "security protocol {} requires a SASL mechanism",
                    self.security_protocol.as_config_value()
                )));
            }
            (false, Some(mechanism)) => {
                return Err(PublishError::Configuration(format!(
                    "SASL mechanism {} requires a SASL security protocol",
                    mechanism.as_config_value()
                )));
            }
            (false, None) => {}
            (true, Some(mechanism)) => {
                let (username, password) = self.credentials(mechanism)?;
                config.set("sasl.mechanism", mechanism.as_config_value());

                if mechanism == SaslMechanism::OAuthBearer {
                    let endpoint = self.oauth_token_endpoint.as_deref().ok_or_else(|| {
                        PublishError::Configuration(
                            "OAUTHBEARER requires an OAuth token endpoint".to_string(),
                        )
                    })?;
                    config
                        .set("sasl.oauthbearer.method", "oidc")
                        .set("sasl.oauthbearer.client.id", username)
                        .set("sasl.oauthbearer.client.secret", password)
                        .set("sasl.oauthbearer.token.endpoint.url", endpoint);
                    if let Some(scope) = &self.oauth_scope {
                        config.set("sasl.oauthbearer.scope", scope);
                    }
                } else {
                    config
                        .set("sasl.username", username)
                        .set("sasl.password", password);
                }
            }
        }

        for (key, value) in &self.extra_properties {
            config.set(key, value);
        }

        Ok(config)
    }

    fn credentials(&self, mechanism: SaslMechanism) -> Result<(&str, &str), PublishError> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() => Ok((username, password)),
            _ => Err(PublishError::Configuration(format!(
                "SASL mechanism {} requires a username and password",
                mechanism.as_config_value()
            ))),
        }
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .field("security_protocol", &self.security_protocol)
            .field("sasl_mechanism", &self.sasl_mechanism)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("oauth_token_endpoint", &self.oauth_token_endpoint)
            .field("message_timeout", &self.message_timeout)
            .finish_non_exhaustive()
    }
}

/// Retry schedule for retriable delivery failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), doubling each time.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Configuration for the publish queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of messages buffered before `publish` waits
    pub capacity: usize,
    /// How long `publish` waits for buffer space before failing with
    /// `QueueFull`
    pub enqueue_timeout: Duration,
    /// Maximum messages handed to the transport at once
    pub batch_size: usize,
    /// How long the worker waits to fill a batch
    pub linger: Duration,
    /// Maximum batches being transmitted concurrently
    pub max_in_flight: usize,
    pub retry: RetryPolicy,
}

impl QueueConfig {
    pub(crate) fn validate(&self) -> Result<(), PublishError> {
        if self.capacity == 0 {
            return Err(PublishError::Configuration(
                "queue capacity must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(PublishError::Configuration(
                "batch size must be greater than zero".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(PublishError::Configuration(
                "max in-flight batches must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            enqueue_timeout: Duration::from_secs(5),
            batch_size: 100,
            linger: Duration::from_millis(5),
            max_in_flight: 5,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_client_config() {
        let config = BrokerConfig::new(["broker-1:9092", "broker-2:9092"])
            .client_config()
            .unwrap();

        assert_eq!(
            config.get("bootstrap.servers"),
            Some("broker-1:9092,broker-2:9092")
        );
        assert_eq!(config.get("security.protocol"), Some("plaintext"));
        assert_eq!(config.get("message.timeout.ms"), Some("5000"));
        assert_eq!(config.get("sasl.mechanism"), None);
    }

    #[test]
    fn test_sasl_ssl_plain_client_config() {
        let config = BrokerConfig::new(["pkc-1234.confluent.cloud:9092"])
            .with_sasl_credentials(SaslMechanism::Plain, "api-key", "api-secret")
            .client_config()
            .unwrap();

        assert_eq!(config.get("security.protocol"), Some("sasl_ssl"));
        assert_eq!(config.get("sasl.mechanism"), Some("PLAIN"));
        assert_eq!(config.get("sasl.username"), Some("api-key"));
        assert_eq!(config.get("sasl.password"), Some("api-secret"));
    }

    #[test]
    fn test_oauthbearer_requires_endpoint() {
        let mut broker = BrokerConfig::new(["localhost:9092"]).with_sasl_credentials(
            SaslMechanism::OAuthBearer,
            "client-id",
            "client-secret",
        );
        assert!(matches!(
            broker.client_config(),
            Err(PublishError::Configuration(_))
        ));

        broker.oauth_token_endpoint = Some("https://idp.example.com/token".to_string());
        let config = broker.client_config().unwrap();
        assert_eq!(config.get("sasl.mechanism"), Some("OAUTHBEARER"));
        assert_eq!(config.get("sasl.oauthbearer.method"), Some("oidc"));
        assert_eq!(config.get("sasl.oauthbearer.client.id"), Some("client-id"));
        assert_eq!(config.get("sasl.username"), None);
    }

    #[test]
    fn test_inconsistent_auth_rejected() {
        let mut broker = BrokerConfig::new(["localhost:9092"]);
        broker.security_protocol = SecurityProtocol::SaslSsl;
        assert!(broker.client_config().is_err());

        broker.sasl_mechanism = Some(SaslMechanism::ScramSha512);
        assert!(broker.client_config().is_err(), "missing credentials");

        let mut broker = BrokerConfig::new(["localhost:9092"]);
        broker.sasl_mechanism = Some(SaslMechanism::Plain);
        assert!(broker.client_config().is_err(), "SASL without SASL protocol");

        assert!(BrokerConfig::new(Vec::<String>::new()).client_config().is_err());
    }

    #[test]
    fn test_extra_properties_applied_last() {
        let mut broker = BrokerConfig::new(["localhost:9092"]);
        broker.extra_properties = vec![
            ("linger.ms".to_string(), "5".to_string()),
            ("message.timeout.ms".to_string(), "1000".to_string()),
        ];
        let config = broker.client_config().unwrap();
        assert_eq!(config.get("linger.ms"), Some("5"));
        assert_eq!(config.get("message.timeout.ms"), Some("1000"));
    }

    #[test]
    fn test_debug_masks_password() {
        let broker = BrokerConfig::new(["localhost:9092"]).with_sasl_credentials(
            SaslMechanism::Plain,
            "api-key",
            "api-secret",
        );
        let debug = format!("{broker:?}");
        assert!(debug.contains("api-key"));
        assert!(!debug.contains("api-secret"));
    }

    #[test]
    fn test_retry_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn test_queue_config_validation() {
        assert!(QueueConfig::default().validate().is_ok());
        let config = QueueConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = QueueConfig {
            max_in_flight: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
