//! Transport helpers shared by the Storage API client: building the reqwest client, retrying
//! idempotent requests and mapping responses onto [`Error`].

use std::future::Future;

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// `X-StorageApi-Token`; header names are case-insensitive and `http` stores them lowercase.
pub const TOKEN_HEADER: &str = "x-storageapi-token";

pub(crate) fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let mut token = header::HeaderValue::from_str(&config.token)?;
    token.set_sensitive(true);

    let mut headers = header::HeaderMap::new();
    headers.insert(header::HeaderName::from_static(TOKEN_HEADER), token);
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()?)
}

/// Runs `f` until it yields a non-5xx response or `config.max_retries` is exhausted. Only use
/// this for requests that are safe to repeat.
pub(crate) async fn execute_with_retry<F, Fut>(config: &ClientConfig, f: F) -> Result<Response>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<Response, reqwest::Error>>,
{
    let mut retries = 0;
    let max_retries = config.max_retries;

    loop {
        match f().await {
            Ok(response) => {
                if response.status().is_server_error() && retries < max_retries {
                    retries += 1;
                    warn!(
                        "Server error {}, retrying (attempt {}/{})",
                        response.status(),
                        retries,
                        max_retries
                    );
                    tokio::time::sleep(config.retry_delay(retries)).await;
                    continue;
                }
                return Ok(response);
            }
            Err(e) => {
                if retries >= max_retries {
                    return Err(Error::from(e));
                }
                retries += 1;
                warn!(
                    "Request failed, retrying (attempt {}/{}): {}",
                    retries, max_retries, e
                );
                tokio::time::sleep(config.retry_delay(retries)).await;
            }
        }
    }
}

/// Decodes a successful response body as `T`, or turns an error status into [`Error`].
pub(crate) async fn handle_response<T>(path: &str, response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let body = success_body(response).await?;
    decode_body(path, &body)
}

/// Like [`handle_response`] for endpoints whose success body carries nothing of interest.
pub(crate) async fn handle_empty_response(response: Response) -> Result<()> {
    success_body(response).await.map(|_| ())
}

async fn success_body(response: Response) -> Result<String> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.text().await?);
    }

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::AuthenticationFailed),
        _ => Err(Error::ApiError {
            status: status.as_u16(),
            message: extract_error_message(&error_body),
        }),
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        path: path.to_string(),
        source,
    })
}

/// Storage error bodies look like `{"error": "...", "code": "...", "status": "error"}`. Falls
/// back to the raw body for anything else.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("error") {
            Some(serde_json::Value::String(message)) => Some(message.clone()),
            _ => v.get("message").and_then(|m| m.as_str()).map(str::to_string),
        })
        .unwrap_or_else(|| body.trim().to_string())
}
