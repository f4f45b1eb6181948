//! Scripted engine for tests.
//!
//! Responses are queued per request key and consumed in order. The key of a
//! named request is its id, or `"{id}|{path}"` when a path override is set
//! and a response was queued under that exact key. Ad-hoc definitions and bare
//! paths are keyed by their path.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;

use super::{DataResponse, EngineError, ListResponse, RawResponse, SiteEngine};
use crate::config::SiteConfig;
use crate::request::{RequestTarget, SiteRequest};

/// Which engine operation a call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    One,
    List,
    Raw,
}

/// A request observed by [`ScriptedEngine`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub key: String,
    pub request: SiteRequest,
}

#[derive(Debug)]
enum Scripted {
    Data(DataResponse),
    List(ListResponse),
    Raw(RawResponse),
    Error(EngineError),
}

/// Engine double replaying canned responses and recording requests.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, key: &str, scripted: Scripted) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Queues a single-object response served from `https://site.example/`.
    pub fn push_data(&self, key: &str, value: Value) {
        self.push_data_response(
            key,
            DataResponse {
                value,
                request_url: "https://site.example/".to_string(),
                status: 200,
            },
        );
    }

    pub fn push_data_response(&self, key: &str, response: DataResponse) {
        self.push(key, Scripted::Data(response));
    }

    /// Queues a list page with the given next-page cursor.
    pub fn push_list(&self, key: &str, items: Vec<Value>, next_page: &str) {
        self.push_list_response(
            key,
            ListResponse {
                items,
                domain: "https://site.example/".to_string(),
                request_url: "https://site.example/".to_string(),
                next_page: next_page.to_string(),
            },
        );
    }

    pub fn push_list_response(&self, key: &str, response: ListResponse) {
        self.push(key, Scripted::List(response));
    }

    pub fn push_raw(&self, key: &str, data: impl Into<Bytes>) {
        self.push(
            key,
            Scripted::Raw(RawResponse {
                data: data.into(),
                domain: "https://site.example/".to_string(),
            }),
        );
    }

    pub fn push_error(&self, key: &str, error: EngineError) {
        self.push(key, Scripted::Error(error));
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Requests received under `key`.
    pub fn calls_for(&self, key: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.key == key)
            .cloned()
            .collect()
    }

    /// Number of queued responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses.lock().values().map(VecDeque::len).sum()
    }

    fn key_for(&self, request: &SiteRequest) -> String {
        match request.target() {
            RequestTarget::Named { id, path: Some(path) } => {
                let exact = format!("{id}|{path}");
                if self.responses.lock().contains_key(&exact) {
                    exact
                } else {
                    id.to_string()
                }
            }
            RequestTarget::Named { id, path: None } => id.to_string(),
            RequestTarget::AdHoc {
                path: Some(path), ..
            } => path.to_string(),
            RequestTarget::AdHoc { definition, .. } => definition.path.clone(),
            RequestTarget::Path(path) => path.to_string(),
            RequestTarget::Missing => String::new(),
        }
    }

    fn next(&self, kind: CallKind, request: &SiteRequest) -> Result<Scripted, EngineError> {
        let key = self.key_for(request);
        self.calls.lock().push(RecordedCall {
            kind,
            key: key.clone(),
            request: request.clone(),
        });
        self.responses
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or(EngineError::UnknownRequest { id: key })
    }
}

fn kind_mismatch(expected: &str) -> EngineError {
    EngineError::InvalidRequest {
        reason: format!("scripted response is not a {expected} response"),
    }
}

#[async_trait]
impl SiteEngine for ScriptedEngine {
    async fn fetch_one(
        &self,
        _config: &SiteConfig,
        request: &SiteRequest,
    ) -> Result<DataResponse, EngineError> {
        match self.next(CallKind::One, request)? {
            Scripted::Data(response) => Ok(response),
            Scripted::Error(error) => Err(error),
            _ => Err(kind_mismatch("data")),
        }
    }

    async fn fetch_list(
        &self,
        _config: &SiteConfig,
        request: &SiteRequest,
    ) -> Result<ListResponse, EngineError> {
        match self.next(CallKind::List, request)? {
            Scripted::List(response) => Ok(response),
            Scripted::Error(error) => Err(error),
            _ => Err(kind_mismatch("list")),
        }
    }

    async fn fetch_raw(
        &self,
        _config: &SiteConfig,
        request: &SiteRequest,
    ) -> Result<RawResponse, EngineError> {
        match self.next(CallKind::Raw, request)? {
            Scripted::Raw(response) => Ok(response),
            Scripted::Error(error) => Err(error),
            _ => Err(kind_mismatch("raw")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestId, RequestParams};
    use crate::types::Site;

    #[tokio::test]
    async fn test_responses_are_consumed_in_order() {
        let engine = ScriptedEngine::new();
        let config = SiteConfig::default();
        let request = RequestParams::named(RequestId::Profile).build(&Site::default());

        engine.push_data("profile", serde_json::json!({"username": "first"}));
        engine.push_error(
            "profile",
            EngineError::Transport {
                reason: "reset".to_string(),
            },
        );

        let first = engine.fetch_one(&config, &request).await.unwrap();
        assert_eq!(first.value["username"], "first");
        assert!(engine.fetch_one(&config, &request).await.is_err());
        assert!(matches!(
            engine.fetch_one(&config, &request).await,
            Err(EngineError::UnknownRequest { id }) if id == "profile"
        ));
        assert_eq!(engine.calls_for("profile").len(), 3);
    }

    #[tokio::test]
    async fn test_path_specific_key_wins() {
        let engine = ScriptedEngine::new();
        let config = SiteConfig::default();
        engine.push_list("seeding_statistics|page=2", Vec::new(), "");
        engine.push_list("seeding_statistics", Vec::new(), "page=2");

        let first = RequestParams::named(RequestId::SeedingStatistics).build(&Site::default());
        let second = RequestParams::named(RequestId::SeedingStatistics)
            .with_path("page=2")
            .build(&Site::default());

        assert_eq!(engine.fetch_list(&config, &first).await.unwrap().next_page, "page=2");
        assert_eq!(engine.fetch_list(&config, &second).await.unwrap().next_page, "");
        assert_eq!(engine.pending(), 0);
    }
}
