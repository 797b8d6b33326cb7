//! Client for the Realtime Database REST endpoint.
//!
//! Every path is addressed as `{base}/{path}.json`. Reads are `GET`, whole
//! array writes are `PUT`, and multi-path updates are a `PATCH` at the root.
//! The database secret, when configured, rides along as the `auth` query
//! parameter.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{CustomField, Member, Team};
use crate::roster::RosterStore;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Database path holding the custom field definitions.
pub const FIELDS_PATH: &str = "_config/customFields";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Realtime Database client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RealtimeDbClient {
    client: Client,
    base_url: String,
    secret: Option<String>,
}

impl RealtimeDbClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: None,
        })
    }

    /// Same connection pool, authenticated with `secret`.
    pub fn with_secret(&self, secret: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            secret: Some(secret),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(ref secret) = self.secret {
                request = request.query(&[("auth", secret.as_str())]);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PUT, path, Some(body)).await?;
        Ok(())
    }

    async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PATCH, path, Some(body)).await?;
        Ok(())
    }
}

impl RosterStore for RealtimeDbClient {
    async fn fetch_team(&self, team: Team) -> Result<Vec<Member>> {
        let value: serde_json::Value = self
            .get(team.path())
            .await
            .with_context(|| format!("Failed to fetch {} roster", team))?;
        let members = Member::list_from_value(value);
        debug!(team = %team, count = members.len(), "Fetched team roster");
        Ok(members)
    }

    async fn replace_team(&self, team: Team, members: &[Member]) -> Result<()> {
        self.put(team.path(), members)
            .await
            .with_context(|| format!("Failed to save {} roster", team))
    }

    async fn replace_teams(&self, teams: &[(Team, Vec<Member>)]) -> Result<()> {
        let update = multi_path_update(teams)?;
        self.patch("", &update)
            .await
            .context("Failed to apply multi-team update")
    }

    async fn fetch_fields(&self) -> Result<Vec<CustomField>> {
        let value: serde_json::Value = self
            .get(FIELDS_PATH)
            .await
            .context("Failed to fetch custom fields")?;
        Ok(CustomField::list_from_value(value))
    }

    async fn replace_fields(&self, fields: &[CustomField]) -> Result<()> {
        self.put(FIELDS_PATH, fields)
            .await
            .context("Failed to save custom fields")
    }
}

/// Body for a root `PATCH` writing several team arrays at once.
fn multi_path_update(teams: &[(Team, Vec<Member>)]) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut update = serde_json::Map::new();
    for (team, members) in teams {
        update.insert(team.path().to_string(), serde_json::to_value(members)?);
    }
    Ok(update)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = RealtimeDbClient::new("https://roster-demo.firebaseio.com/").unwrap();
        assert_eq!(client.url("brass"), "https://roster-demo.firebaseio.com/brass.json");
        assert_eq!(
            client.url(FIELDS_PATH),
            "https://roster-demo.firebaseio.com/_config/customFields.json"
        );
        assert_eq!(client.url(""), "https://roster-demo.firebaseio.com/.json");
    }

    #[test]
    fn test_with_secret_keeps_base() {
        let client = RealtimeDbClient::new("https://roster-demo.firebaseio.com").unwrap();
        let authed = client.with_secret("s3cret".to_string());
        assert_eq!(authed.base_url(), client.base_url());
        assert_eq!(authed.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_multi_path_update_body() {
        let moved = Member {
            id: "card-1".to_string(),
            team: Team::Brass,
            ..Default::default()
        };
        let update = multi_path_update(&[(Team::Inbound, Vec::new()), (Team::Brass, vec![moved])]).unwrap();
        assert_eq!(update["inbound"], serde_json::json!([]));
        assert_eq!(update["brass"][0]["rowId"], "card-1");
        assert_eq!(update["brass"][0]["teamSelect"], "brass-container");
    }
}
