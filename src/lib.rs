//! Solum client library
//!
//! SDK bindings for the Solum application-deployment API: Keystone
//! authentication, a generic resource manager with name-or-UUID lookup,
//! and the GitHub helper used when registering apps.

pub mod api;
pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod resource;

pub use error::{Error, Result};
