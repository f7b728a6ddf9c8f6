pub mod cache;
pub mod client_ip;
pub mod geolocation;
pub mod openweather;
pub mod parser;
pub mod weather;

use crate::errors::AppError;

/// Longest slice of a provider error body kept in error context.
const MAX_ERROR_BODY: usize = 200;

/// Send a provider request and return the response body.
///
/// Send failures (connect, timeout) and non-2xx statuses become
/// `AppError::UpstreamTransport`; the status is kept when one was received.
pub(crate) async fn provider_get(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<String, AppError> {
    let response = request.send().await.map_err(|e| AppError::UpstreamTransport {
        provider,
        status: None,
        context: format!("request failed: {}", e),
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::UpstreamTransport {
            provider,
            status: Some(status),
            context: format!("failed to read response body: {}", e),
        })?;

    if !status.is_success() {
        return Err(AppError::UpstreamTransport {
            provider,
            status: Some(status),
            context: format!("HTTP {}: {}", status, truncate_body(&body)),
        });
    }

    Ok(body)
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
