// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registrar worker contract and test doubles

mod fake;
mod traits;

pub use fake::{FakeCatalog, FakeRegistrar};
pub use traits::{
    AssetPage, CatalogError, CatalogSource, RegistrarAdapter, RegistrarError, RegistrarRequest,
    RegistrarResponse,
};
