//! reqflow Catalog - reference data for the request lifecycle engine
//!
//! Provides:
//! - [`Catalog`]: the read-only lookup surface the engine depends on
//! - [`InMemoryCatalog`]: validated, lock-guarded storage with admin upserts
//! - [`CatalogData`]: the catalog document, loadable from TOML, YAML or JSON
//! - Consistency rules reported as [`CatalogIssue`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use reqflow_catalog::{Catalog, InMemoryCatalog};
//!
//! let catalog = InMemoryCatalog::load("catalog.toml".as_ref())?;
//! let erp = catalog.system_by_name("ERP");
//! ```

#![allow(missing_docs)]

pub mod data;
pub mod error;
pub mod store;
pub mod validation;

pub use data::CatalogData;
pub use error::CatalogError;
pub use store::{Catalog, InMemoryCatalog};
pub use validation::CatalogIssue;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
