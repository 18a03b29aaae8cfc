//! Test doubles and common utilities for contract tests
//!
//! The doubles here implement the core traits in memory, with call counters
//! so tests can assert how often the remote side was touched.

#![allow(dead_code)]

use async_trait::async_trait;
use cloudcontrol_core::model::{
    ApiResponse, EntitySummary, IpRange, NatRule, NetworkDomain, NetworkDomainEdit,
    NewNetworkDomain, NewVlan, PagedResult, Paging, Server, UserAccount, Vlan, VlanEdit,
};
use cloudcontrol_core::protect::{AesGcmProtector, CredentialProtector, MasterKey};
use cloudcontrol_core::{
    ClientFactory, CloudControlApi, ConnectionProfile, Error, Result,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Protector with a fixed master key
pub fn test_protector(purpose: &str) -> Arc<dyn CredentialProtector> {
    Arc::new(AesGcmProtector::new(
        &MasterKey::from_bytes([42u8; 32]),
        purpose,
    ))
}

pub fn profile(name: &str) -> ConnectionProfile {
    ConnectionProfile::new(name, "AU", format!("{}-user", name), format!("{}-password", name))
}

pub fn vlan(id: &str, state: &str) -> Vlan {
    Vlan {
        id: id.to_string(),
        network_domain: EntitySummary {
            id: "nd-1".to_string(),
            name: "prod".to_string(),
        },
        name: format!("vlan-{}", id),
        description: None,
        private_ipv4_range: IpRange {
            address: "10.0.0.0".to_string(),
            prefix_size: 24,
        },
        ipv4_gateway_address: Some("10.0.0.1".to_string()),
        ipv6_range: None,
        ipv6_gateway_address: None,
        gateway_addressing: None,
        create_time: None,
        state: state.to_string(),
        datacenter_id: Some("AU9".to_string()),
    }
}

/// In-memory CloudControl API serving VLANs
///
/// `get_vlan` walks through the scripted states for an id, repeating the last
/// one. Ids without a script are not found. Everything else is unsupported.
pub struct FakeCloudApi {
    region: String,
    vlan_states: Mutex<HashMap<String, Vec<String>>>,
    get_calls: AtomicUsize,
    closed: AtomicBool,
    delay: Duration,
}

impl FakeCloudApi {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            vlan_states: Mutex::new(HashMap::new()),
            get_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            delay: Duration::ZERO,
        }
    }

    /// Make every `get_vlan` take `delay` (cancellable)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn script_vlan(&self, id: &str, states: &[&str]) {
        self.vlan_states.lock().unwrap().insert(
            id.to_string(),
            states.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn unsupported<T>(operation: &str) -> Result<T> {
        Err(Error::api(
            "UNSUPPORTED_OPERATION",
            format!("{} is not supported by the fake API", operation),
        ))
    }
}

#[async_trait]
impl CloudControlApi for FakeCloudApi {
    fn region(&self) -> &str {
        &self.region
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn get_account(&self, _cancel: &CancellationToken) -> Result<UserAccount> {
        Self::unsupported("get_account")
    }

    async fn list_network_domains(
        &self,
        _datacenter_id: Option<&str>,
        _paging: Option<Paging>,
        _cancel: &CancellationToken,
    ) -> Result<PagedResult<NetworkDomain>> {
        Self::unsupported("list_network_domains")
    }

    async fn get_network_domain(
        &self,
        _id: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>> {
        Ok(None)
    }

    async fn get_network_domain_by_name(
        &self,
        _name: &str,
        _datacenter_id: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>> {
        Ok(None)
    }

    async fn create_network_domain(
        &self,
        _request: &NewNetworkDomain,
        _cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        Self::unsupported("create_network_domain")
    }

    async fn edit_network_domain(
        &self,
        _edit: &NetworkDomainEdit,
        _cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        Self::unsupported("edit_network_domain")
    }

    async fn delete_network_domain(
        &self,
        _id: &str,
        _cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        Self::unsupported("delete_network_domain")
    }

    async fn list_vlans(
        &self,
        _network_domain_id: Option<&str>,
        _paging: Option<Paging>,
        _cancel: &CancellationToken,
    ) -> Result<PagedResult<Vlan>> {
        Self::unsupported("list_vlans")
    }

    async fn get_vlan(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Vlan>> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed(self.region.clone()));
        }

        let call = self.get_calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        let scripts = self.vlan_states.lock().unwrap();
        Ok(scripts.get(id).and_then(|states| {
            states
                .get(call.min(states.len().saturating_sub(1)))
                .map(|state| vlan(id, state))
        }))
    }

    async fn get_vlan_by_name(
        &self,
        _name: &str,
        _network_domain_id: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<Option<Vlan>> {
        Ok(None)
    }

    async fn create_vlan(&self, _request: &NewVlan, _cancel: &CancellationToken) -> Result<ApiResponse> {
        Self::unsupported("create_vlan")
    }

    async fn edit_vlan(&self, _edit: &VlanEdit, _cancel: &CancellationToken) -> Result<ApiResponse> {
        Self::unsupported("edit_vlan")
    }

    async fn expand_vlan(
        &self,
        _id: &str,
        _private_ipv4_prefix_size: u8,
        _cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        Self::unsupported("expand_vlan")
    }

    async fn delete_vlan(&self, _id: &str, _cancel: &CancellationToken) -> Result<ApiResponse> {
        Self::unsupported("delete_vlan")
    }

    async fn list_servers(
        &self,
        _network_domain_id: Option<&str>,
        _paging: Option<Paging>,
        _cancel: &CancellationToken,
    ) -> Result<PagedResult<Server>> {
        Self::unsupported("list_servers")
    }

    async fn get_server(&self, _id: &str, _cancel: &CancellationToken) -> Result<Option<Server>> {
        Ok(None)
    }

    async fn get_server_by_name(
        &self,
        _name: &str,
        _network_domain_id: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<Option<Server>> {
        Ok(None)
    }

    async fn delete_server(&self, _id: &str, _cancel: &CancellationToken) -> Result<ApiResponse> {
        Self::unsupported("delete_server")
    }

    async fn list_nat_rules(
        &self,
        _network_domain_id: &str,
        _paging: Option<Paging>,
        _cancel: &CancellationToken,
    ) -> Result<PagedResult<NatRule>> {
        Self::unsupported("list_nat_rules")
    }

    async fn get_nat_rule(&self, _id: &str, _cancel: &CancellationToken) -> Result<Option<NatRule>> {
        Ok(None)
    }
}

/// Client factory that counts how many clients it built
#[derive(Default)]
pub struct CountingFactory {
    created: AtomicUsize,
    clients: Mutex<Vec<Arc<FakeCloudApi>>>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Clients built so far, in creation order
    pub fn clients(&self) -> Vec<Arc<FakeCloudApi>> {
        self.clients.lock().unwrap().clone()
    }
}

impl ClientFactory for CountingFactory {
    fn create(&self, profile: &ConnectionProfile) -> Result<Arc<dyn CloudControlApi>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let client = Arc::new(FakeCloudApi::new(&profile.region));
        self.clients.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }
}
