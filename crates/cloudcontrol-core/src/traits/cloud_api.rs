// # CloudControl API Trait
//
// Defines the interface commands use to talk to the CloudControl REST API.
//
// ## Implementations
//
// - HTTP: `cloudcontrol-client` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use cloudcontrol_core::CloudControlApi;
// use tokio_util::sync::CancellationToken;
//
// async fn show(client: &dyn CloudControlApi) -> cloudcontrol_core::Result<()> {
//     let cancel = CancellationToken::new();
//     if let Some(vlan) = client.get_vlan("0e56433f-...", &cancel).await? {
//         println!("{} is {}", vlan.name, vlan.state);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::model::{
    ApiResponse, NatRule, NetworkDomain, NetworkDomainEdit, NewNetworkDomain, NewVlan,
    PagedResult, Paging, Server, UserAccount, Vlan, VlanEdit,
};
use crate::profile::ConnectionProfile;
use crate::Result;

/// Client for one CloudControl region and user
///
/// Every remote call takes a cancellation token; a cancelled call returns
/// [`crate::Error::Cancelled`] without waiting for the server.
///
/// Lookups by id return `Ok(None)` when the resource does not exist. Mutating
/// calls return the API's response envelope; a non-success response is an
/// [`crate::Error::Api`]. Implementations never retry.
#[async_trait]
pub trait CloudControlApi: Send + Sync {
    /// Region this client talks to
    fn region(&self) -> &str;

    /// Abort in-flight requests and reject new ones
    fn close(&self);

    /// Whether [`close`](Self::close) has been called
    fn is_closed(&self) -> bool;

    /// Account of the authenticated user
    async fn get_account(&self, cancel: &CancellationToken) -> Result<UserAccount>;

    // Network domains

    async fn list_network_domains(
        &self,
        datacenter_id: Option<&str>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<NetworkDomain>>;

    async fn get_network_domain(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>>;

    async fn get_network_domain_by_name(
        &self,
        name: &str,
        datacenter_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>>;

    async fn create_network_domain(
        &self,
        request: &NewNetworkDomain,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse>;

    async fn edit_network_domain(
        &self,
        edit: &NetworkDomainEdit,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse>;

    async fn delete_network_domain(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse>;

    // VLANs

    async fn list_vlans(
        &self,
        network_domain_id: Option<&str>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Vlan>>;

    async fn get_vlan(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Vlan>>;

    async fn get_vlan_by_name(
        &self,
        name: &str,
        network_domain_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<Vlan>>;

    async fn create_vlan(&self, request: &NewVlan, cancel: &CancellationToken)
    -> Result<ApiResponse>;

    async fn edit_vlan(&self, edit: &VlanEdit, cancel: &CancellationToken) -> Result<ApiResponse>;

    /// Grow a VLAN's private IPv4 range to a smaller prefix size
    async fn expand_vlan(
        &self,
        id: &str,
        private_ipv4_prefix_size: u8,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse>;

    async fn delete_vlan(&self, id: &str, cancel: &CancellationToken) -> Result<ApiResponse>;

    // Servers

    async fn list_servers(
        &self,
        network_domain_id: Option<&str>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Server>>;

    async fn get_server(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Server>>;

    async fn get_server_by_name(
        &self,
        name: &str,
        network_domain_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<Server>>;

    async fn delete_server(&self, id: &str, cancel: &CancellationToken) -> Result<ApiResponse>;

    // NAT rules

    async fn list_nat_rules(
        &self,
        network_domain_id: &str,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<NatRule>>;

    async fn get_nat_rule(&self, id: &str, cancel: &CancellationToken)
    -> Result<Option<NatRule>>;
}

/// Helper trait for constructing API clients from connection profiles
pub trait ClientFactory: Send + Sync {
    /// Create a client for `profile`
    ///
    /// The profile's password is plaintext at this point.
    fn create(&self, profile: &ConnectionProfile) -> Result<Arc<dyn CloudControlApi>>;
}
