//! Resource abstraction layer
//!
//! This module provides a data-driven approach to managing Solum resources.
//! Resource kinds are defined in a JSON file embedded at compile time, and a
//! single generic manager performs CRUD for all of them.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource kind definitions from embedded JSON
//! - [`manager`] - CRUD over HTTP and name-or-UUID resolution
//! - [`model`] - Map-backed resource snapshots
//!
//! # Resource Definitions
//!
//! Kinds are defined in `src/resources/solum.json`: plans, assemblies, apps,
//! components, pipelines, language packs and (per-app) workflows.
//!
//! # Example
//!
//! ```ignore
//! use solum::resource::Lookup;
//!
//! async fn show(client: &solum::api::SolumClient) -> solum::Result<()> {
//!     let assemblies = client.manager("assembly")?;
//!     let assembly = assemblies.find(Lookup::NameOrId("ghost")).await?;
//!     println!("{}", assembly.display("status"));
//!     Ok(())
//! }
//! ```

mod manager;
mod model;
mod registry;

pub use manager::{
    filter_resources, is_uuid_like, unwrap_collection, unwrap_single, Lookup, ResourceManager,
};
pub use model::Resource;
pub use registry::*;
