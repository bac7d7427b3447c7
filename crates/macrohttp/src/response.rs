//! Response passed through the interceptor chain

use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{business, error::Result};

/// Decoded HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Response headers; repeated headers keep every value
    pub headers: HeaderMap,
    /// Final URL (may differ from request URL due to redirects)
    pub url: String,
    /// JSON body; non-JSON bodies are kept as a string, empty bodies as `null`
    pub data: Value,
}

impl ApiResponse {
    /// Response built from a payload recovered by the business-code step
    pub fn from_payload(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            url: String::new(),
            data,
        }
    }

    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let headers = response.headers().clone();

        let bytes = response.bytes().await?;
        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(Self {
            status,
            headers,
            url,
            data,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// First value of a header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a repeated header, in received order
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Deserialize the body
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Classify the body by its `code` field
    pub fn settle(self) -> Result<Value> {
        business::settle(self.data)
    }
}
