//! Remote functions
//!
//! Email delivery and automation run as remote functions invoked by name:
//! `POST {base_url}/functions/v1/{name}` with a bearer key and a JSON body.

use crate::config::FunctionsConfig;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const SEND_EMAIL: &str = "send-email";
pub const EMAIL_AUTOMATION: &str = "email-automation";

/// Longest slice of an error body kept in messages
const BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("Remote functions are not configured")]
    NotConfigured,

    #[error("Failed to call {name}: {source}")]
    Http {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{name} returned {status}: {body}")]
    Status {
        name: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {name}: {message}")]
    Decode { name: String, message: String },
}

/// One address or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub to: Recipients,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendEmailResponse {
    #[serde(default)]
    pub total_sent: i64,
    #[serde(default)]
    pub total_failed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRequest {
    pub trigger_type: String,
    pub campaign: Value,
}

#[async_trait]
pub trait RemoteFunctions: Send + Sync {
    async fn send_email(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, FunctionError>;

    async fn email_automation(&self, request: &AutomationRequest) -> Result<Value, FunctionError>;
}

pub type DynRemoteFunctions = Arc<dyn RemoteFunctions>;

/// HTTP client for the functions host
pub struct HttpFunctions {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpFunctions {
    pub fn new(config: &FunctionsConfig) -> Result<Self, FunctionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| FunctionError::Http {
                name: "client".to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: config
                .base_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            api_key: config.api_key.clone(),
        })
    }

    pub fn boxed(config: &FunctionsConfig) -> Result<DynRemoteFunctions, FunctionError> {
        Ok(Arc::new(Self::new(config)?))
    }

    pub fn function_url(&self, name: &str) -> Result<String, FunctionError> {
        let base = self.base_url.as_deref().ok_or(FunctionError::NotConfigured)?;
        Ok(format!("{base}/functions/v1/{name}"))
    }

    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<reqwest::Request, FunctionError> {
        let mut builder = self.client.post(self.function_url(name)?).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder.build().map_err(|source| FunctionError::Http {
            name: name.to_string(),
            source,
        })
    }

    async fn invoke<B, R>(&self, name: &str, body: &B) -> Result<R, FunctionError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.build_request(name, body)?;
        let http_err = |source| FunctionError::Http {
            name: name.to_string(),
            source,
        };

        let response = self.client.execute(request).await.map_err(http_err)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(http_err)?;

        if !status.is_success() {
            let raw = String::from_utf8_lossy(&bytes);
            let body: String = raw.chars().take(BODY_PREVIEW_CHARS).collect();
            tracing::warn!(%status, body = %body, "Remote function {} failed", name);
            return Err(FunctionError::Status {
                name: name.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| FunctionError::Decode {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RemoteFunctions for HttpFunctions {
    async fn send_email(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, FunctionError> {
        self.invoke(SEND_EMAIL, request).await
    }

    async fn email_automation(&self, request: &AutomationRequest) -> Result<Value, FunctionError> {
        self.invoke(EMAIL_AUTOMATION, request).await
    }
}
