//! Thin HTTP client for the remote CLI commands.

use anyhow::Context;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

/// Status and decoded JSON body of an API call
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    /// Body of a 2xx reply, or an error carrying the server's message
    pub fn into_result(self) -> anyhow::Result<Value> {
        if self.status.is_success() {
            return Ok(self.body);
        }

        let message = self
            .body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        anyhow::bail!("{} ({})", message, self.status)
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).with_context(|| format!("Invalid server URL '{}'", base_url))?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { http, base_url, token })
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<ApiReply> {
        let request = self.http.get(self.endpoint(path)?);
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<ApiReply> {
        let request = self.http.post(self.endpoint(path)?).json(body);
        self.send(request).await
    }

    /// Fail early for commands that hit protected endpoints
    pub fn require_token(&self) -> anyhow::Result<()> {
        if self.token.is_none() {
            anyhow::bail!("A bearer token is required (--token or RECEPTIONIST_TOKEN)");
        }
        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> anyhow::Result<ApiReply> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_joins_under_base_path() {
        let client = ApiClient::new("https://api.example.com/v1", None).unwrap();
        assert_eq!(
            client.endpoint("/api/guard").unwrap().as_str(),
            "https://api.example.com/v1/api/guard"
        );
    }

    #[test]
    fn error_reply_surfaces_server_message() {
        let reply = ApiReply {
            status: StatusCode::FORBIDDEN,
            body: json!({"error": "Owner mismatch", "code": "FORBIDDEN"}),
        };
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Owner mismatch (403 Forbidden)");
    }

    #[test]
    fn missing_token_is_reported() {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        assert!(client.require_token().is_err());
    }
}
