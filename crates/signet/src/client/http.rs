//! HTTP transport backed by `reqwest`.

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiResponse, Transport};
use crate::error::{Result, SignetError};

/// Thin wrapper over a registry endpoint, e.g. `http://localhost:1337`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn into_response(resp: reqwest::Response) -> ApiResponse {
        let status = resp.status().as_u16();
        // Non-JSON bodies become null; the status already tells the story.
        let data = resp.json::<Value>().await.unwrap_or(Value::Null);
        ApiResponse { status, data }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn do_get(&self, path: &str, query: &[(String, String)]) -> Result<ApiResponse> {
        log::debug!("GET {} {:?}", self.url(path), query);
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| SignetError::Transport(e.to_string()))?;
        Ok(Self::into_response(resp).await)
    }

    async fn do_post(
        &self,
        path: &str,
        params: &Value,
        headers: &[(String, String)],
    ) -> Result<ApiResponse> {
        log::debug!("POST {}", self.url(path));
        let mut req = self.http.post(self.url(path)).json(params);
        for (name, value) in headers {
            req = req.header(name, value);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| SignetError::Transport(e.to_string()))?;
        Ok(Self::into_response(resp).await)
    }

    async fn do_patch(
        &self,
        path: &str,
        params: &Value,
        headers: &[(String, String)],
    ) -> Result<ApiResponse> {
        log::debug!("PATCH {}", self.url(path));
        let mut req = self.http.patch(self.url(path)).json(params);
        for (name, value) in headers {
            req = req.header(name, value);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| SignetError::Transport(e.to_string()))?;
        Ok(Self::into_response(resp).await)
    }
}
