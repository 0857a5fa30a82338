//! Shared HTTP plumbing for provider clients.

use pavepath_core::RoutingProviderError;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(
    provider: &str,
    timeout: Duration,
) -> Result<Client, RoutingProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pavepath/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| RoutingProviderError::transport(provider, err))
}

/// Read a JSON body, turning non-success HTTP statuses into provider errors.
pub(crate) fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, RoutingProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        tracing::warn!(provider, status = %status, "provider returned error status");
        return Err(RoutingProviderError::Status {
            provider: provider.to_string(),
            status: status.as_u16().to_string(),
            message: truncate(&body, 200),
        });
    }
    response
        .json::<T>()
        .map_err(|err| RoutingProviderError::malformed(provider, err.to_string()))
}

/// `abcd...wxyz` for logs. Short keys are fully hidden.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Remove markup tags from provider instruction text.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ").replace("&amp;", "&")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
