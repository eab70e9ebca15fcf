//! Generation service clients.
//!
//! The workflow only sees [`GenerationClient`]. [`HttpGenerationClient`]
//! sends rendered prompts to a configurable HTTP endpoint; every connection,
//! status or decoding failure comes back as [`ArtigenError::Transport`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::artifact::model::Prompt;
use crate::error::{ArtigenError, ArtigenResult};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Turns prompts into generated content records.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompts: &[Prompt]) -> ArtigenResult<Vec<Value>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLocation {
    #[default]
    Header,
    Query,
}

fn default_key_name() -> String {
    "X-API-Key".to_string()
}

/// Authentication scheme for the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    Basic {
        username: String,
        #[serde(default)]
        password: Option<String>,
    },
    Bearer {
        token: String,
    },
    ApiKey {
        key: String,
        #[serde(default = "default_key_name")]
        key_name: String,
        #[serde(default)]
        location: KeyLocation,
    },
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Where and how to reach the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: String::new(),
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            auth: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load a JSON service description.
    pub fn from_file(path: &Path) -> ArtigenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            ArtigenError::Config(format!("Invalid service config {}: {}", path.display(), e))
        })
    }

    /// Full request URL.
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let endpoint = self.endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, endpoint)
        }
    }
}

/// HTTP generation client.
#[derive(Clone)]
pub struct HttpGenerationClient {
    config: ServiceConfig,
    client: reqwest::Client,
}

impl HttpGenerationClient {
    pub fn new(config: ServiceConfig) -> ArtigenResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ArtigenError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn request(&self, body: &Value) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(self.config.method.as_reqwest(), self.config.url())
            .json(body);

        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        match &self.config.auth {
            None => request,
            Some(AuthConfig::Basic { username, password }) => {
                request.basic_auth(username, password.as_deref())
            }
            Some(AuthConfig::Bearer { token }) => request.bearer_auth(token),
            Some(AuthConfig::ApiKey {
                key,
                key_name,
                location: KeyLocation::Header,
            }) => request.header(key_name.as_str(), key.as_str()),
            Some(AuthConfig::ApiKey {
                key,
                key_name,
                location: KeyLocation::Query,
            }) => request.query(&[(key_name.as_str(), key.as_str())]),
        }
    }
}

/// Request body: every prompt with its rendered text.
pub fn build_payload(prompts: &[Prompt]) -> ArtigenResult<Value> {
    let prompts = prompts
        .iter()
        .map(|prompt| -> ArtigenResult<Value> {
            Ok(json!({
                "template": prompt.template,
                "context": prompt.context,
                "rendered": prompt.render()?,
            }))
        })
        .collect::<ArtigenResult<Vec<_>>>()?;

    Ok(json!({ "prompts": prompts }))
}

/// Accept either a bare array of records or `{"content": [...]}`.
pub fn extract_content(response: Value) -> ArtigenResult<Vec<Value>> {
    match response {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("content") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(ArtigenError::transport(
                "Response object has no 'content' array",
            )),
        },
        other => Err(ArtigenError::transport(format!(
            "Unexpected response shape: {}",
            other
        ))),
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, prompts: &[Prompt]) -> ArtigenResult<Vec<Value>> {
        let payload = build_payload(prompts)?;
        let url = self.config.url();

        let response = self
            .request(&payload)
            .send()
            .await
            .map_err(|e| ArtigenError::transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, url = %url, "Generation service returned an error");
            return Err(ArtigenError::transport(format!(
                "Generation service error ({}): {}",
                status, body
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ArtigenError::transport(format!("Failed to parse response: {}", e)))?;

        let records = extract_content(value)?;
        debug!(prompts = prompts.len(), records = records.len(), "Generation service replied");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::model::{ArtifactType, PromptTemplate};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompt() -> Prompt {
        Prompt {
            template: PromptTemplate::new("doc", ArtifactType::Documentation, "About {{ purpose }}")
                .fields(),
            context: json!({"purpose": "x"}),
        }
    }

    #[test]
    fn test_url_joining() {
        let mut config = ServiceConfig::new("https://llm.example.com/");
        assert_eq!(config.url(), "https://llm.example.com");
        config.endpoint = "/v1/generate".to_string();
        assert_eq!(config.url(), "https://llm.example.com/v1/generate");
    }

    #[test]
    fn test_config_from_json() {
        let config: ServiceConfig = serde_json::from_value(json!({
            "base_url": "https://llm.example.com",
            "endpoint": "generate",
            "auth": {"type": "api_key", "key": "secret", "location": "query"}
        }))
        .unwrap();

        assert_eq!(config.method, HttpMethod::Post);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(
            config.auth,
            Some(AuthConfig::ApiKey {
                key: "secret".to_string(),
                key_name: "X-API-Key".to_string(),
                location: KeyLocation::Query,
            })
        );
    }

    #[test]
    fn test_build_payload() {
        let payload = build_payload(&[prompt()]).unwrap();
        assert_eq!(payload["prompts"][0]["rendered"], json!("About x"));
        assert_eq!(payload["prompts"][0]["context"], json!({"purpose": "x"}));
    }

    #[test]
    fn test_extract_content() {
        assert_eq!(
            extract_content(json!([{"text": "a"}])).unwrap(),
            vec![json!({"text": "a"})]
        );
        assert_eq!(
            extract_content(json!({"content": [{"text": "b"}]})).unwrap(),
            vec![json!({"text": "b"})]
        );
        assert!(matches!(
            extract_content(json!({"text": "c"})),
            Err(ArtigenError::Transport(_))
        ));
        assert!(matches!(extract_content(json!("c")), Err(ArtigenError::Transport(_))));
    }

    #[tokio::test]
    async fn test_generate_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("authorization", "Bearer t0ken"))
            .and(body_partial_json(json!({"prompts": [{"rendered": "About x"}]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"content": [{"text": "generated"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ServiceConfig::new(server.uri());
        config.endpoint = "generate".to_string();
        config.auth = Some(AuthConfig::Bearer {
            token: "t0ken".to_string(),
        });

        let client = HttpGenerationClient::new(config).unwrap();
        let records = client.generate(&[prompt()]).await.unwrap();
        assert_eq!(records, vec![json!({"text": "generated"})]);
    }

    #[tokio::test]
    async fn test_api_key_in_query() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/generate"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"text": "a"}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ServiceConfig::new(server.uri());
        config.endpoint = "/v1/generate".to_string();
        config.method = HttpMethod::Put;
        config.auth = Some(AuthConfig::ApiKey {
            key: "secret".to_string(),
            key_name: "key".to_string(),
            location: KeyLocation::Query,
        });

        let client = HttpGenerationClient::new(config).unwrap();
        assert_eq!(client.generate(&[prompt()]).await.unwrap(), vec![json!({"text": "a"})]);
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "busy"})))
            .mount(&server)
            .await;

        let client = HttpGenerationClient::new(ServiceConfig::new(server.uri())).unwrap();
        let err = client.generate(&[prompt()]).await.unwrap_err();
        assert!(matches!(err, ArtigenError::Transport(_)));
    }
}
