// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registrar worker and catalog source contracts
//!
//! The registrar is the external collaborator that enumerates current
//! catalog assets and upserts one record per asset into the replicated
//! store. The orchestrator may invoke it more than once for the same
//! timestamp, so implementations must be idempotent by asset id.

use crate::asset::AssetRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invocation payload: the raw trigger input plus the execution start time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarRequest {
    pub input: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful registrar invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarResponse {
    /// Number of asset records upserted into the state store
    pub assets_written: usize,
}

/// Errors from registrar invocations
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("registrar throttled: {0}")]
    Throttled(String),
    #[error("registrar unavailable: {0}")]
    Unavailable(String),
    #[error("state store write failed: {0}")]
    StoreWrite(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RegistrarError {
    /// Service-level failures are eligible for the orchestrator's retry
    /// policy; everything else fails the task immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistrarError::Throttled(_)
            | RegistrarError::Unavailable(_)
            | RegistrarError::StoreWrite(_) => true,
            RegistrarError::Catalog(e) => e.is_retryable(),
            RegistrarError::InvalidRequest(_) => false,
        }
    }

    /// Stable error-kind tag carried into the execution's error payload
    pub fn kind(&self) -> &'static str {
        match self {
            RegistrarError::Throttled(_) => "Throttled",
            RegistrarError::Unavailable(_) => "Unavailable",
            RegistrarError::StoreWrite(_) => "StoreWrite",
            RegistrarError::Catalog(_) => "Catalog",
            RegistrarError::InvalidRequest(_) => "InvalidRequest",
        }
    }
}

/// Errors from the source catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog throttled: {0}")]
    Throttled(String),
    #[error("catalog query failed: {0}")]
    Query(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
}

impl CatalogError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Throttled(_))
    }
}

/// The registrar worker invoked by the orchestrator
#[async_trait]
pub trait RegistrarAdapter: Clone + Send + Sync + 'static {
    /// Enumerate current assets and upsert them into the state store.
    ///
    /// Success means every current asset record was written; failure is
    /// reported as a task failure to the orchestrator.
    async fn invoke(&self, request: RegistrarRequest) -> Result<RegistrarResponse, RegistrarError>;
}

/// One page of catalog search results
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPage {
    pub items: Vec<AssetRecord>,
    /// Index of the next page, if any
    pub next: Option<usize>,
}

/// The source system the registrar enumerates assets from
#[async_trait]
pub trait CatalogSource: Clone + Send + Sync + 'static {
    /// Fetch one page of the current assets owned by the given project.
    async fn search_assets(
        &self,
        domain_id: &str,
        project_id: &str,
        page: usize,
    ) -> Result<AssetPage, CatalogError>;
}
