// # Resource Fetcher Trait
//
// Single-resource lookups, generic over the resource kind. The poller and
// target resolution are written against this trait; every `CloudControlApi`
// is a fetcher for each resource kind it serves.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::model::{NatRule, NetworkDomain, Resource, Server, Vlan};
use crate::traits::CloudControlApi;
use crate::{Error, Result};

/// Fetch one resource of kind `R`
#[async_trait]
pub trait ResourceFetcher<R: Resource>: Send + Sync {
    /// Look up a resource by id; `Ok(None)` when it does not exist
    async fn fetch(&self, id: &str, cancel: &CancellationToken) -> Result<Option<R>>;

    /// Look up a resource by name within an optional parent
    ///
    /// Kinds that cannot be looked up by name keep the default, which rejects
    /// the request.
    async fn fetch_by_name(
        &self,
        name: &str,
        parent: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<R>> {
        let _ = (name, parent, cancel);
        Err(Error::unrecognized_parameter_set(format!(
            "By name ({})",
            R::KIND
        )))
    }
}

#[async_trait]
impl ResourceFetcher<NetworkDomain> for dyn CloudControlApi {
    async fn fetch(&self, id: &str, cancel: &CancellationToken) -> Result<Option<NetworkDomain>> {
        self.get_network_domain(id, cancel).await
    }

    async fn fetch_by_name(
        &self,
        name: &str,
        parent: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>> {
        self.get_network_domain_by_name(name, parent, cancel).await
    }
}

#[async_trait]
impl ResourceFetcher<Vlan> for dyn CloudControlApi {
    async fn fetch(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Vlan>> {
        self.get_vlan(id, cancel).await
    }

    async fn fetch_by_name(
        &self,
        name: &str,
        parent: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<Vlan>> {
        self.get_vlan_by_name(name, parent, cancel).await
    }
}

#[async_trait]
impl ResourceFetcher<Server> for dyn CloudControlApi {
    async fn fetch(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Server>> {
        self.get_server(id, cancel).await
    }

    async fn fetch_by_name(
        &self,
        name: &str,
        parent: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<Server>> {
        self.get_server_by_name(name, parent, cancel).await
    }
}

#[async_trait]
impl ResourceFetcher<NatRule> for dyn CloudControlApi {
    async fn fetch(&self, id: &str, cancel: &CancellationToken) -> Result<Option<NatRule>> {
        self.get_nat_rule(id, cancel).await
    }
}
