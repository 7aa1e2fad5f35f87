// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::{QuerySource, RetryPolicy};

pub mod response;

pub use response::QueryResponse;

const RESULTS_MEDIA_TYPE: &str = "application/sparql-results+json";

/// Ceiling on a single retry delay.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Endpoint URL with the query text and result format as parameters.
pub fn request_url(source: &QuerySource) -> Url {
    let mut url = source.endpoint.clone();
    url.query_pairs_mut()
        .append_pair("query", &source.query)
        .append_pair("format", "json");
    url
}

async fn get_text_core(client: &Client, url: &Url, user_agent: &str) -> Result<String> {
    debug!("Fetching text from {}", url);
    client
        .get(url.clone())
        .header(header::ACCEPT, RESULTS_MEDIA_TYPE)
        .header(header::USER_AGENT, user_agent)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))
}

/// Delay before retry number `attempt` (1-based): the initial backoff doubled
/// per earlier attempt, saturating at `MAX_BACKOFF_MS`.
fn backoff_delay(retry: RetryPolicy, attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| retry.initial_backoff_ms.checked_mul(factor))
        .unwrap_or(u64::MAX)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

async fn get_text_with_retry(
    client: &Client,
    url: &Url,
    user_agent: &str,
    retry: RetryPolicy,
) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url, user_agent).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < retry.max_retries => {
                attempts += 1;
                let backoff = backoff_delay(retry, attempts);
                warn!(attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                sleep(backoff).await;
            }
            Err(e) => {
                error!(error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

/// Send `source.query` to its endpoint and decode the result set.
#[instrument(level = "info", skip_all, fields(endpoint = %source.endpoint))]
pub async fn fetch_results(client: &Client, source: &QuerySource) -> Result<QueryResponse> {
    let url = request_url(source);
    info!(url = %url, "HTTP request");

    let body = get_text_with_retry(client, &url, &source.contact.user_agent(), source.retry).await?;
    let response = QueryResponse::parse(&body)
        .with_context(|| format!("response from {}", source.endpoint))?;

    info!(
        vars = response.vars().len(),
        bindings = response.bindings().len(),
        "decoded results"
    );
    Ok(response)
}
