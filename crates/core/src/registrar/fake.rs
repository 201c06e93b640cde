//! Fake registrar and catalog implementations for testing

use super::traits::*;
use crate::asset::AssetRecord;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted invocation outcome
#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Succeed { assets_written: usize },
    FailRetryable { message: String },
    FailPermanent { message: String },
}

#[derive(Default)]
struct FakeRegistrarState {
    calls: Vec<RegistrarRequest>,
    outcomes: VecDeque<ScriptedOutcome>,
    /// Outcome used once the script runs out
    default_assets_written: usize,
}

/// Fake registrar with scripted outcomes and call recording
#[derive(Clone)]
pub struct FakeRegistrar {
    state: Arc<Mutex<FakeRegistrarState>>,
}

impl Default for FakeRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRegistrar {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeRegistrarState::default())),
        }
    }

    /// All recorded invocation requests, in order
    pub fn calls(&self) -> Vec<RegistrarRequest> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Number of invocations so far
    pub fn call_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .len()
    }

    /// Set the asset count reported once scripted outcomes are exhausted
    pub fn set_assets_written(&self, count: usize) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .default_assets_written = count;
    }

    /// Script the next invocation to succeed with the given asset count
    pub fn push_success(&self, assets_written: usize) {
        self.push(ScriptedOutcome::Succeed { assets_written });
    }

    /// Script the next invocation to fail with a retryable service error
    pub fn push_retryable_failure(&self, message: impl Into<String>) {
        self.push(ScriptedOutcome::FailRetryable {
            message: message.into(),
        });
    }

    /// Script the next invocation to fail with a permanent error
    pub fn push_permanent_failure(&self, message: impl Into<String>) {
        self.push(ScriptedOutcome::FailPermanent {
            message: message.into(),
        });
    }

    /// Script `count` retryable failures followed by unscripted success
    pub fn fail_times(&self, count: usize, message: impl Into<String>) {
        let message = message.into();
        for _ in 0..count {
            self.push_retryable_failure(message.clone());
        }
    }

    fn push(&self, outcome: ScriptedOutcome) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .outcomes
            .push_back(outcome);
    }
}

#[async_trait]
impl RegistrarAdapter for FakeRegistrar {
    async fn invoke(&self, request: RegistrarRequest) -> Result<RegistrarResponse, RegistrarError> {
        let outcome = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.calls.push(request);
            state
                .outcomes
                .pop_front()
                .unwrap_or(ScriptedOutcome::Succeed {
                    assets_written: state.default_assets_written,
                })
        };

        match outcome {
            ScriptedOutcome::Succeed { assets_written } => {
                Ok(RegistrarResponse { assets_written })
            }
            ScriptedOutcome::FailRetryable { message } => {
                Err(RegistrarError::Unavailable(message))
            }
            ScriptedOutcome::FailPermanent { message } => {
                Err(RegistrarError::InvalidRequest(message))
            }
        }
    }
}

#[derive(Default)]
struct FakeCatalogState {
    pages: Vec<Vec<AssetRecord>>,
    fail_on_page: Option<usize>,
}

/// Fake catalog source serving fixed pages of assets
#[derive(Clone)]
pub struct FakeCatalog {
    state: Arc<Mutex<FakeCatalogState>>,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeCatalogState::default())),
        }
    }

    /// Create a catalog with a single page of assets
    pub fn with_assets(assets: Vec<AssetRecord>) -> Self {
        let catalog = Self::new();
        catalog.add_page(assets);
        catalog
    }

    /// Append a page of assets
    pub fn add_page(&self, assets: Vec<AssetRecord>) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pages
            .push(assets);
    }

    /// Make enumeration fail when it reaches the given page index
    pub fn fail_on_page(&self, page: usize) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_on_page = Some(page);
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn search_assets(
        &self,
        _domain_id: &str,
        _project_id: &str,
        page: usize,
    ) -> Result<AssetPage, CatalogError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.fail_on_page == Some(page) {
            return Err(CatalogError::Query(format!("page {} unavailable", page)));
        }

        let items = state.pages.get(page).cloned().unwrap_or_default();
        let next = if page + 1 < state.pages.len() {
            Some(page + 1)
        } else {
            None
        };

        Ok(AssetPage { items, next })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
