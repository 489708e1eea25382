//! Solum API interaction module
//!
//! This module provides the core functionality for talking to the Solum
//! application-deployment API: Keystone authentication, the HTTP wrapper,
//! and the client that hands out resource managers.
//!
//! # Module Structure
//!
//! - [`auth`] - Keystone token/endpoint resolution
//! - [`client`] - Main Solum client for making API requests
//! - [`http`] - HTTP utilities and error mapping for REST calls
//!
//! # Example
//!
//! ```ignore
//! use solum::api::{AuthOptions, HttpOptions, SolumClient};
//! use solum::resource::Lookup;
//!
//! async fn example(auth: &AuthOptions) -> solum::Result<()> {
//!     let client = SolumClient::connect(auth, &HttpOptions::default(), "1").await?;
//!     let plan = client.manager("plan")?.find(Lookup::NameOrId("my-app")).await?;
//!     println!("{:?}", plan.uri());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

pub use auth::{AuthOptions, Session};
pub use client::SolumClient;
pub use http::{ApiResponse, Body, HttpClient, HttpOptions};
