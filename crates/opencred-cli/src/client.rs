//! # Registry API Client
//!
//! Thin reqwest wrapper shared by the HTTP subcommands. Responses are
//! surfaced as raw JSON; non-2xx responses become errors carrying the
//! server's `{"error": ...}` message.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

/// HTTP client bound to a registry base URL and optional bearer token.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client. `base_url` has any trailing slash stripped.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn handle(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("response body was not JSON")?;
        if status.is_success() {
            Ok(body)
        } else {
            let message = body["error"].as_str().unwrap_or("unknown error").to_string();
            Err(anyhow!("{status}: {message}"))
        }
    }

    /// POST a JSON body to a path.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .authorize(self.http.post(&url).json(body))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        self.handle(response).await
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        self.handle(response).await
    }
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(_) => println!("{value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:8080/", None);
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
