use log::debug;
use serde_json::Value;

use async_trait::async_trait;

use crate::core::Result;
use crate::transport::{Method, Transport, TransportResponse};

/// Transport implementation over a plain REST API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
    ) -> Result<TransportResponse> {
        let url = self.url(path);
        debug!("{} {url}", method.as_str());

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        let data = serde_json::from_str(&body).unwrap_or(Value::Null);

        Ok(TransportResponse::new(status, data))
    }
}
