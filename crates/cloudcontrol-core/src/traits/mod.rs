//! Core traits for CloudControl tooling
//!
//! - [`CloudControlApi`]: remote calls against one region
//! - [`ClientFactory`]: builds API clients from connection profiles
//! - [`ResourceFetcher`]: single-resource lookups used by the poller

pub mod cloud_api;
pub mod resource_fetcher;

pub use cloud_api::{ClientFactory, CloudControlApi};
pub use resource_fetcher::ResourceFetcher;
