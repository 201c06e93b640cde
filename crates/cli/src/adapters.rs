// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring between operator configuration and the engine

use anyhow::{Context, Result};
use async_trait::async_trait;
use ferry_core::{AssetPage, AssetRecord, CatalogError, CatalogSource, PipelineConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Assets served per catalog page
const PAGE_SIZE: usize = 50;

/// Catalog source reading asset snapshots from a JSON file.
///
/// The file holds an array of asset records; the current file contents
/// are re-read on every enumeration, so a run always snapshots the
/// catalog as it is at invocation time.
#[derive(Clone)]
pub struct FileCatalog {
    path: Arc<PathBuf>,
}

impl FileCatalog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: Arc::new(path.to_path_buf()),
        }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn search_assets(
        &self,
        _domain_id: &str,
        _project_id: &str,
        page: usize,
    ) -> Result<AssetPage, CatalogError> {
        let text = std::fs::read_to_string(self.path.as_ref())
            .map_err(|e| CatalogError::Query(format!("{}: {}", self.path.display(), e)))?;
        let assets: Vec<AssetRecord> =
            serde_json::from_str(&text).map_err(|e| CatalogError::Query(e.to_string()))?;

        let start = page.saturating_mul(PAGE_SIZE);
        let items = assets.iter().skip(start).take(PAGE_SIZE).cloned().collect();
        let next = if start + PAGE_SIZE < assets.len() {
            Some(page + 1)
        } else {
            None
        };
        Ok(AssetPage { items, next })
    }
}

/// Load the configuration file, defaulting the data directory to the
/// platform data dir when the file does not set one
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if config.data_dir.is_none() {
        config.data_dir = dirs::data_dir().map(|d| d.join("ferry"));
    }
    tracing::debug!(
        config = %path.display(),
        data_dir = ?config.data_dir,
        "loaded configuration"
    );
    Ok(config)
}
