// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-backed registrar worker
//!
//! Enumerates the current assets of one catalog project page by page and
//! upserts a snapshot record for each into the replicated table. Because
//! every write is an upsert keyed by asset id, invoking the registrar
//! twice for the same timestamp leaves the store in the same state as
//! invoking it once; the orchestrator's retry policy relies on this.

use async_trait::async_trait;
use ferry_core::{
    CatalogSource, Clock, RegistrarAdapter, RegistrarError, RegistrarRequest, RegistrarResponse,
};
use ferry_store::ReplicatedTable;

/// Registrar implementation backed by the replicated state store
#[derive(Clone)]
pub struct StoreRegistrar<C, K> {
    catalog: C,
    table: ReplicatedTable,
    clock: K,
    domain_id: String,
    project_id: String,
}

impl<C, K> StoreRegistrar<C, K>
where
    C: CatalogSource,
    K: Clock + 'static,
{
    pub fn new(
        catalog: C,
        table: ReplicatedTable,
        clock: K,
        domain_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            table,
            clock,
            domain_id: domain_id.into(),
            project_id: project_id.into(),
        }
    }

    pub fn table(&self) -> &ReplicatedTable {
        &self.table
    }
}

#[async_trait]
impl<C, K> RegistrarAdapter for StoreRegistrar<C, K>
where
    C: CatalogSource,
    K: Clock + 'static,
{
    async fn invoke(&self, request: RegistrarRequest) -> Result<RegistrarResponse, RegistrarError> {
        tracing::info!(
            domain = %self.domain_id,
            project = %self.project_id,
            timestamp = %request.timestamp,
            "enumerating catalog assets"
        );

        let mut page = 0;
        let mut assets_written = 0;
        loop {
            let result = self
                .catalog
                .search_assets(&self.domain_id, &self.project_id, page)
                .await?;

            for record in result.items {
                let asset_id = record.asset_id.clone();
                self.table
                    .put_item(record, self.clock.now_utc())
                    .map_err(|e: ferry_store::StoreError| {
                        RegistrarError::StoreWrite(e.to_string())
                    })?;
                assets_written += 1;
                tracing::debug!(asset = %asset_id, page, "registered asset");
            }

            match result.next {
                Some(next) => page = next,
                None => break,
            }
        }

        tracing::info!(assets_written, "registrar run complete");
        Ok(RegistrarResponse { assets_written })
    }
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod tests;
