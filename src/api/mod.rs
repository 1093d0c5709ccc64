//! openHAB REST API access.
//!
//! The check logic only sees the [`Fetcher`] trait; [`RestClient`] is the
//! HTTP implementation.

mod client;

pub use client::*;

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// API error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("object does not exist: {url}")]
    ObjectNotFound { url: String },
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// An item as returned by `GET /items/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Present for groups only.
    #[serde(default)]
    pub members: Vec<Item>,
}

impl Item {
    /// openHAB 1 reports groups as `GroupItem`, later versions as `Group`.
    pub fn is_group(&self) -> bool {
        matches!(self.kind.as_str(), "GroupItem" | "Group")
    }
}

/// A thing as returned by `GET /things/{uid}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    #[serde(rename = "UID")]
    pub uid: String,
    pub status_info: StatusInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Resolves REST URLs to decoded objects.
pub trait Fetcher {
    /// URL of the item called `name`.
    fn item_url(&self, name: &str) -> String;

    /// URL of the thing with `uid`.
    fn thing_url(&self, uid: &str) -> String;

    fn fetch_item(&self, url: &str) -> impl Future<Output = Result<Item, ApiError>>;

    fn fetch_thing(&self, url: &str) -> impl Future<Output = Result<Thing, ApiError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_group_item() {
        let item: Item = serde_json::from_str(
            r#"{
                "link": "http://localhost:8080/rest/items/Sensors",
                "state": "NULL",
                "type": "Group",
                "name": "Sensors",
                "tags": [],
                "groupNames": [],
                "members": [
                    {"link": "http://localhost:8080/rest/items/Temp", "state": "21.5",
                     "type": "Number", "name": "Temp"},
                    {"link": "http://localhost:8080/rest/items/Upstairs", "state": "NULL",
                     "type": "Group", "name": "Upstairs"}
                ]
            }"#,
        )
        .unwrap();

        assert!(item.is_group());
        assert_eq!(item.members.len(), 2);
        assert_eq!(item.members[0].state, "21.5");
        assert!(!item.members[0].is_group());
        assert!(item.members[1].is_group());
    }

    #[test]
    fn test_decode_legacy_group_type() {
        let item: Item =
            serde_json::from_str(r#"{"type": "GroupItem", "name": "G", "state": "Undefined"}"#)
                .unwrap();
        assert!(item.is_group());
        assert!(item.members.is_empty());
        assert!(item.link.is_none());
    }

    #[test]
    fn test_decode_thing() {
        let thing: Thing = serde_json::from_str(
            r#"{
                "UID": "zwave:device:controller:node5",
                "label": "Front door",
                "statusInfo": {"status": "OFFLINE", "statusDetail": "COMMUNICATION_ERROR"}
            }"#,
        )
        .unwrap();
        assert_eq!(thing.uid, "zwave:device:controller:node5");
        assert_eq!(thing.status_info.status, "OFFLINE");
        assert_eq!(thing.status_info.status_detail.as_deref(), Some("COMMUNICATION_ERROR"));
    }
}
