//! Thin reqwest wrapper shared by the typed API clients

use cinerama_core::{ApiError, ApiResult};
use cinerama_shared::ApiEnvelope;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.authorize(self.client.get(self.url(path)));
        let response = request.send().await.map_err(transport_error)?;
        Self::handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        let response = request.send().await.map_err(transport_error)?;
        Self::handle_response(response).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.authorize(self.client.post(self.url(path)));
        let response = request.send().await.map_err(transport_error)?;
        Self::handle_response(response).await
    }

    /// Raw GET that keeps the response open for streaming (used by the
    /// SSE feed)
    pub async fn get_stream(&self, path: &str) -> ApiResult<reqwest::Response> {
        let request = self.authorize(self.client.get(self.url(path)));
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Backend(format!(
                "stream request failed with status {status}"
            )));
        }
        Ok(response)
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if !status.is_success() {
            let message = extract_message(response).await;
            return match status {
                StatusCode::CONFLICT => Err(ApiError::Conflict(message)),
                StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
                _ => Err(ApiError::Backend(message)),
            };
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.into_data().map_err(ApiError::Backend)
    }
}

fn transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}

/// Pull the server message out of an error body, falling back to the raw
/// text when it is not an envelope
async fn extract_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&text) {
        if let Some(message) = envelope.message {
            return message;
        }
    }
    if text.is_empty() {
        format!("request failed with status {status}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = HttpClient::new(&ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout_secs: 5,
            token: None,
        })
        .unwrap();
        assert_eq!(
            client.url("/seats/generate"),
            "http://localhost:8080/api/seats/generate"
        );
    }
}
