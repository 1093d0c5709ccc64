//! HTTP fetcher for the REST API.

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{ApiError, Fetcher, Item, Thing};
use crate::config::ConnectionConfig;

/// REST client carrying its own credentials and timeout.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    config: ConnectionConfig,
}

impl RestClient {
    pub fn new(config: ConnectionConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| ApiError::Transport {
                url: config.base_url(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(creds) = &self.config.credentials {
            request = request.basic_auth(&creds.username, creds.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    url: url.to_string(),
                    timeout: self.config.timeout,
                }
            } else {
                ApiError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::ObjectNotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    url: url.to_string(),
                    timeout: self.config.timeout,
                }
            } else {
                ApiError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

impl Fetcher for RestClient {
    fn item_url(&self, name: &str) -> String {
        self.config.item_url(name)
    }

    fn thing_url(&self, uid: &str) -> String {
        self.config.thing_url(uid)
    }

    async fn fetch_item(&self, url: &str) -> Result<Item, ApiError> {
        self.get(url).await
    }

    async fn fetch_thing(&self, url: &str) -> Result<Thing, ApiError> {
        self.get(url).await
    }
}
