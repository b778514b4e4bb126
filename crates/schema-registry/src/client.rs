//! HTTP client for a Confluent-compatible schema registry.
//!
//! Provides a simple interface to register and look up JSON schemas through
//! the registry REST API.

use crate::error::{Result, SchemaError};
use crate::schema::SchemaDescriptor;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Schema type sent with registration requests.
const SCHEMA_TYPE_JSON: &str = "JSON";

/// Connection settings for the schema registry.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Base URL of the registry (e.g. "https://psrc-xxxx.region.aws.confluent.cloud")
    pub url: String,
    /// Basic auth credentials in `user:secret` form
    pub basic_auth_user_info: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            basic_auth_user_info: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_basic_auth(mut self, user_info: impl Into<String>) -> Self {
        self.basic_auth_user_info = Some(user_info.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Split `user:secret` into its parts.
    fn credentials(&self) -> Result<Option<(String, String)>> {
        let Some(user_info) = &self.basic_auth_user_info else {
            return Ok(None);
        };

        match user_info.split_once(':') {
            Some((user, secret)) if !user.is_empty() => {
                Ok(Some((user.to_string(), secret.to_string())))
            }
            _ => Err(SchemaError::Configuration(
                "registry basic auth must be in 'user:secret' form".to_string(),
            )),
        }
    }
}

/// A schema version stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSchema {
    pub subject: String,
    pub id: i32,
    pub version: i32,
    pub schema: String,
    #[serde(rename = "schemaType", default)]
    pub schema_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterSchemaRequest<'a> {
    schema: &'a str,
    #[serde(rename = "schemaType")]
    schema_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterSchemaResponse {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct SchemaByIdResponse {
    schema: String,
}

/// Error body returned by the registry on failures
#[derive(Debug, Deserialize)]
struct RegistryErrorBody {
    #[allow(dead_code)]
    error_code: Option<i32>,
    message: String,
}

/// HTTP client for schema registry operations
#[derive(Clone)]
pub struct SchemaRegistryClient {
    base_url: String,
    http_client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl SchemaRegistryClient {
    /// Create a new client. Does not contact the registry.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let url = Url::parse(&config.url).map_err(|e| {
            SchemaError::Configuration(format!("invalid registry URL '{}': {e}", config.url))
        })?;
        if url.cannot_be_a_base() {
            return Err(SchemaError::Configuration(format!(
                "invalid registry URL '{}': not an HTTP base URL",
                config.url
            )));
        }

        let credentials = config.credentials()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                SchemaError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http_client,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/subjects/{subject}/{tail..}` with the subject percent-encoded
    /// as a single path segment.
    fn subject_url(&self, subject: &str, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            SchemaError::Configuration(format!("invalid registry URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SchemaError::Configuration(format!(
                    "invalid registry URL '{}': not an HTTP base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("subjects")
            .push(subject)
            .extend(tail);
        Ok(url)
    }

    /// Register a schema under `subject` and return its id.
    ///
    /// Registering a schema that already exists under the subject returns the
    /// existing id.
    pub async fn register_schema(&self, subject: &str, schema: &SchemaDescriptor) -> Result<i32> {
        let url = self.subject_url(subject, &["versions"])?;
        let request = RegisterSchemaRequest {
            schema: schema.canonical(),
            schema_type: SCHEMA_TYPE_JSON,
        };

        let response = self
            .execute(self.http_client.post(url).json(&request), "register schema")
            .await?;
        let registered: RegisterSchemaResponse = response.json().await.map_err(|e| {
            SchemaError::RegistryUnavailable(format!("failed to parse registration response: {e}"))
        })?;

        tracing::debug!(
            schema_id = registered.id,
            subject = subject,
            "Schema registered successfully"
        );

        Ok(registered.id)
    }

    /// Look up whether `schema` is already registered under `subject`.
    ///
    /// Returns `None` when the subject or the schema is unknown to the registry.
    pub async fn lookup_schema(
        &self,
        subject: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Option<RegisteredSchema>> {
        let url = self.subject_url(subject, &[])?;
        let request = RegisterSchemaRequest {
            schema: schema.canonical(),
            schema_type: SCHEMA_TYPE_JSON,
        };

        let response = match self
            .execute(self.http_client.post(url).json(&request), "look up schema")
            .await
        {
            Ok(response) => response,
            Err(SchemaError::Registry { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let registered: RegisteredSchema = response.json().await.map_err(|e| {
            SchemaError::RegistryUnavailable(format!("failed to parse lookup response: {e}"))
        })?;
        Ok(Some(registered))
    }

    /// Fetch the latest schema version registered under `subject`.
    pub async fn latest_version(&self, subject: &str) -> Result<RegisteredSchema> {
        let url = self.subject_url(subject, &["versions", "latest"])?;
        let response = self
            .execute(self.http_client.get(url), "fetch latest schema version")
            .await?;

        response.json().await.map_err(|e| {
            SchemaError::RegistryUnavailable(format!("failed to parse schema version: {e}"))
        })
    }

    /// Fetch a schema document by its global id.
    pub async fn get_schema_by_id(&self, id: i32) -> Result<String> {
        let url = format!("{}/schemas/ids/{}", self.base_url, id);
        let response = self
            .execute(self.http_client.get(&url), "fetch schema by id")
            .await?;

        let body: SchemaByIdResponse = response.json().await.map_err(|e| {
            SchemaError::RegistryUnavailable(format!("failed to parse schema response: {e}"))
        })?;
        Ok(body.schema)
    }

    /// Send a request, mapping transport failures and server errors to
    /// `RegistryUnavailable` and client errors to `Registry`.
    async fn execute(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let request = match &self.credentials {
            Some((user, secret)) => request.basic_auth(user, Some(secret)),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| SchemaError::RegistryUnavailable(format!("failed to {action}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RegistryErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(SchemaError::RegistryUnavailable(format!(
                "failed to {action}: status {status}: {message}"
            )))
        } else {
            Err(SchemaError::Registry {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field(
                "basic_auth_user_info",
                &self.basic_auth_user_info.as_ref().map(|_| "***"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for SchemaRegistryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistryClient")
            .field("base_url", &self.base_url)
            .field(
                "user",
                &self.credentials.as_ref().map(|(user, _)| user.as_str()),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_parsing() {
        let config = RegistryConfig::new("http://localhost:8081").with_basic_auth("key:se:cret");
        assert_eq!(
            config.credentials().unwrap(),
            Some(("key".to_string(), "se:cret".to_string()))
        );

        let config = RegistryConfig::new("http://localhost:8081");
        assert_eq!(config.credentials().unwrap(), None);

        let config = RegistryConfig::new("http://localhost:8081").with_basic_auth("no-colon");
        assert!(matches!(
            config.credentials(),
            Err(SchemaError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = SchemaRegistryClient::new(RegistryConfig::new("not a url"));
        assert!(matches!(result, Err(SchemaError::Configuration(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = SchemaRegistryClient::new(RegistryConfig::new("http://localhost:8081/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8081");
    }

    #[test]
    fn test_subject_is_encoded_as_one_path_segment() {
        let client = SchemaRegistryClient::new(RegistryConfig::new("http://localhost:8081")).unwrap();
        let url = client.subject_url("orders/v1?x#y", &["versions"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8081/subjects/orders%2Fv1%3Fx%23y/versions"
        );

        let client =
            SchemaRegistryClient::new(RegistryConfig::new("https://host/registry/")).unwrap();
        let url = client.subject_url("input_topic-value", &["versions", "latest"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://host/registry/subjects/input_topic-value/versions/latest"
        );
    }

    #[test]
    fn test_non_base_url_rejected() {
        let result = SchemaRegistryClient::new(RegistryConfig::new("mailto:registry@example.com"));
        assert!(matches!(result, Err(SchemaError::Configuration(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = RegistryConfig::new("http://localhost:8081").with_basic_auth("key:topsecret");
        assert!(!format!("{config:?}").contains("topsecret"));

        let client = SchemaRegistryClient::new(config).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("key"));
        assert!(!debug.contains("topsecret"));
    }
}
