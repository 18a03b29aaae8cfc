// # CloudControl HTTP Client
//
// `reqwest`-based implementation of `CloudControlApi` for the CloudControl
// REST API v2.4.
//
// ## Behaviour
//
// - One HTTP request per call, except the first call needing the organization
//   id, which looks it up once via `caas/2.4/user/myUser`
// - HTTP basic authentication on every request
// - HTTP timeout configured (30 seconds by default)
// - Lookups by id map 404 / `RESOURCE_NOT_FOUND` to `Ok(None)`
// - Other non-success responses become `Error::Api` carrying the API's code
// - Transport failures and 5xx responses become the transient `Error::Http`
// - No retry logic: the resource-state poller is the only place that retries
// - Cancelling the call's token or closing the client aborts in-flight requests
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
//
// ## API Reference
//
// - Base URL: `https://api-{region}.dimensiondata.com/`
// - Current user: GET `caas/2.4/user/myUser`
// - Network domains: GET `caas/2.4/{org}/network/networkDomain[/{id}]`,
//   POST `.../network/{deploy,edit,delete}NetworkDomain`
// - VLANs: GET `caas/2.4/{org}/network/vlan[/{id}]`,
//   POST `.../network/{deploy,edit,expand,delete}Vlan`
// - Servers: GET `caas/2.4/{org}/server/server[/{id}]`, POST `.../server/deleteServer`
// - NAT rules: GET `caas/2.4/{org}/network/natRule[/{id}]`

use async_trait::async_trait;
use cloudcontrol_core::model::{
    ApiResponse, NatRule, NetworkDomain, NetworkDomainEdit, NewNetworkDomain, NewVlan,
    PagedResult, Paging, Resource, Server, UserAccount, Vlan, VlanEdit,
};
use cloudcontrol_core::{
    ClientConfig, ClientFactory, CloudControlApi, ConnectionProfile, Error, Result,
};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

/// API version prefix for every path
const API_PREFIX: &str = "caas/2.4";

/// Longest response excerpt quoted in error messages
const MAX_ERROR_BODY: usize = 512;

/// CloudControl API client for one region and user
pub struct CloudControlClient {
    region: String,

    /// Base URL, always ending with `/`
    base_url: String,

    user_name: String,

    /// ⚠️ NEVER log this value
    password: String,

    http: reqwest::Client,

    /// Organization id, discovered on first use
    organization_id: OnceCell<String>,

    /// Cancelled by `close`
    closed: CancellationToken,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for CloudControlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudControlClient")
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .field("user_name", &self.user_name)
            .field("password", &"<REDACTED>")
            .field("closed", &self.closed.is_cancelled())
            .finish()
    }
}

impl CloudControlClient {
    /// Create a client for a connection profile
    ///
    /// Fails if the profile is incomplete or the HTTP client cannot be built.
    pub fn new(profile: &ConnectionProfile, config: &ClientConfig) -> Result<Self> {
        profile.validate()?;
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            region: profile.region.clone(),
            base_url: config.base_url_for(&profile.region),
            user_name: profile.user_name.clone(),
            password: profile.password.clone(),
            http,
            organization_id: OnceCell::new(),
            closed: CancellationToken::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and read the whole body, honouring cancellation and close
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<(StatusCode, String)> {
        if self.closed.is_cancelled() {
            return Err(Error::ConnectionClosed(self.region.clone()));
        }

        let request = request
            .basic_auth(&self.user_name, Some(&self.password))
            .header(ACCEPT, "application/json");

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;
            Ok::<_, Error>((status, body))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = self.closed.cancelled() => Err(Error::ConnectionClosed(self.region.clone())),
            result = exchange => result,
        }
    }

    /// GET a JSON document; `Ok(None)` when the API reports it does not exist
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<Option<Value>> {
        tracing::debug!("GET {}", path);
        let request = self.http.get(self.url(path)).query(query);
        let (status, body) = self.execute(request, cancel).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return match error_from_response(status, &body) {
                Error::Api { response_code, .. }
                    if response_code == ApiResponse::RESOURCE_NOT_FOUND =>
                {
                    Ok(None)
                }
                err => Err(err),
            };
        }

        let value = serde_json::from_str(&body)?;
        Ok(Some(value))
    }

    /// POST a request body to a mutating operation
    async fn post<B>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized + Sync,
    {
        tracing::debug!("POST {}", path);
        let request = self.http.post(self.url(path)).json(body);
        let (status, text) = self.execute(request, cancel).await?;

        if !status.is_success() {
            return Err(error_from_response(status, &text));
        }

        let response: ApiResponse = serde_json::from_str(&text)?;
        let response = response.into_result()?;

        tracing::info!(
            "{} accepted ({}): {}",
            response.operation,
            response.response_code,
            response.message
        );
        Ok(response)
    }

    async fn fetch_account(&self, cancel: &CancellationToken) -> Result<UserAccount> {
        let path = format!("{}/user/myUser", API_PREFIX);
        let value = self.get_json(&path, &[], cancel).await?.ok_or_else(|| {
            Error::api(
                ApiResponse::RESOURCE_NOT_FOUND,
                "The current user's account could not be found.",
            )
        })?;

        Ok(serde_json::from_value(value)?)
    }

    async fn organization_id(&self, cancel: &CancellationToken) -> Result<&str> {
        let id = self
            .organization_id
            .get_or_try_init(|| async {
                let account = self.fetch_account(cancel).await?;
                tracing::debug!("Organization id for region {} discovered", self.region);
                Ok::<_, Error>(account.organization.id)
            })
            .await?;
        Ok(id.as_str())
    }

    /// Organization-scoped path, e.g. `caas/2.4/{org}/network/vlan`
    async fn org_path(&self, suffix: &str, cancel: &CancellationToken) -> Result<String> {
        let org = self.organization_id(cancel).await?;
        Ok(format!("{}/{}/{}", API_PREFIX, org, suffix))
    }

    async fn list<R: Resource>(
        &self,
        suffix: &str,
        mut query: Vec<(&str, String)>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<R>> {
        let path = self.org_path(suffix, cancel).await?;
        if let Some(paging) = paging {
            query.extend(paging.query());
        }

        match self.get_json(&path, &query, cancel).await? {
            Some(value) => PagedResult::from_json(value),
            None => Ok(PagedResult {
                items: Vec::new(),
                page_number: 0,
                page_count: 0,
                total_count: 0,
                page_size: 0,
            }),
        }
    }

    async fn get_by_id<R: Resource>(
        &self,
        suffix: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<R>> {
        let path = self.org_path(&format!("{}/{}", suffix, id), cancel).await?;
        match self.get_json(&path, &[], cancel).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn first_named<R: Resource>(
        &self,
        suffix: &str,
        name: &str,
        mut query: Vec<(&str, String)>,
        cancel: &CancellationToken,
    ) -> Result<Option<R>> {
        query.push(("name", name.to_string()));
        let page: PagedResult<R> = self.list(suffix, query, None, cancel).await?;
        Ok(page.items.into_iter().find(|item| item.name() == name))
    }
}

/// Map a non-success HTTP response to an error
///
/// 5xx responses are transient transport failures. Anything else carrying the
/// API's response envelope becomes `Error::Api` with the API's own code.
fn error_from_response(status: StatusCode, body: &str) -> Error {
    if status.is_server_error() {
        return Error::http(format!(
            "CloudControl server error {}: {}",
            status,
            excerpt(body)
        ));
    }

    match serde_json::from_str::<ApiResponse>(body) {
        Ok(response) => response.into_error(),
        Err(_) => Error::api(
            format!("HTTP_{}", status.as_u16()),
            format!("{}: {}", status, excerpt(body)),
        ),
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

fn filter(key: &'static str, value: Option<&str>) -> Vec<(&'static str, String)> {
    value
        .map(|value| vec![(key, value.to_string())])
        .unwrap_or_default()
}

#[async_trait]
impl CloudControlApi for CloudControlClient {
    fn region(&self) -> &str {
        &self.region
    }

    fn close(&self) {
        if !self.closed.is_cancelled() {
            tracing::debug!("Closing CloudControl client for region {}", self.region);
        }
        self.closed.cancel();
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    async fn get_account(&self, cancel: &CancellationToken) -> Result<UserAccount> {
        let account = self.fetch_account(cancel).await?;
        let _ = self.organization_id.set(account.organization.id.clone());
        Ok(account)
    }

    async fn list_network_domains(
        &self,
        datacenter_id: Option<&str>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<NetworkDomain>> {
        self.list(
            "network/networkDomain",
            filter("datacenterId", datacenter_id),
            paging,
            cancel,
        )
        .await
    }

    async fn get_network_domain(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>> {
        self.get_by_id("network/networkDomain", id, cancel).await
    }

    async fn get_network_domain_by_name(
        &self,
        name: &str,
        datacenter_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<NetworkDomain>> {
        self.first_named(
            "network/networkDomain",
            name,
            filter("datacenterId", datacenter_id),
            cancel,
        )
        .await
    }

    async fn create_network_domain(
        &self,
        request: &NewNetworkDomain,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let path = self.org_path("network/deployNetworkDomain", cancel).await?;
        self.post(&path, request, cancel).await
    }

    async fn edit_network_domain(
        &self,
        edit: &NetworkDomainEdit,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let path = self.org_path("network/editNetworkDomain", cancel).await?;
        self.post(&path, edit, cancel).await
    }

    async fn delete_network_domain(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let path = self.org_path("network/deleteNetworkDomain", cancel).await?;
        self.post(&path, &json!({ "id": id }), cancel).await
    }

    async fn list_vlans(
        &self,
        network_domain_id: Option<&str>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Vlan>> {
        self.list(
            "network/vlan",
            filter("networkDomainId", network_domain_id),
            paging,
            cancel,
        )
        .await
    }

    async fn get_vlan(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Vlan>> {
        self.get_by_id("network/vlan", id, cancel).await
    }

    async fn get_vlan_by_name(
        &self,
        name: &str,
        network_domain_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<Vlan>> {
        self.first_named(
            "network/vlan",
            name,
            filter("networkDomainId", network_domain_id),
            cancel,
        )
        .await
    }

    async fn create_vlan(
        &self,
        request: &NewVlan,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let path = self.org_path("network/deployVlan", cancel).await?;
        self.post(&path, request, cancel).await
    }

    async fn edit_vlan(&self, edit: &VlanEdit, cancel: &CancellationToken) -> Result<ApiResponse> {
        let path = self.org_path("network/editVlan", cancel).await?;
        self.post(&path, edit, cancel).await
    }

    async fn expand_vlan(
        &self,
        id: &str,
        private_ipv4_prefix_size: u8,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let path = self.org_path("network/expandVlan", cancel).await?;
        let body = json!({ "id": id, "privateIpv4PrefixSize": private_ipv4_prefix_size });
        self.post(&path, &body, cancel).await
    }

    async fn delete_vlan(&self, id: &str, cancel: &CancellationToken) -> Result<ApiResponse> {
        let path = self.org_path("network/deleteVlan", cancel).await?;
        self.post(&path, &json!({ "id": id }), cancel).await
    }

    async fn list_servers(
        &self,
        network_domain_id: Option<&str>,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Server>> {
        self.list(
            "server/server",
            filter("networkDomainId", network_domain_id),
            paging,
            cancel,
        )
        .await
    }

    async fn get_server(&self, id: &str, cancel: &CancellationToken) -> Result<Option<Server>> {
        self.get_by_id("server/server", id, cancel).await
    }

    async fn get_server_by_name(
        &self,
        name: &str,
        network_domain_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<Server>> {
        self.first_named(
            "server/server",
            name,
            filter("networkDomainId", network_domain_id),
            cancel,
        )
        .await
    }

    async fn delete_server(&self, id: &str, cancel: &CancellationToken) -> Result<ApiResponse> {
        let path = self.org_path("server/deleteServer", cancel).await?;
        self.post(&path, &json!({ "id": id }), cancel).await
    }

    async fn list_nat_rules(
        &self,
        network_domain_id: &str,
        paging: Option<Paging>,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<NatRule>> {
        self.list(
            "network/natRule",
            vec![("networkDomainId", network_domain_id.to_string())],
            paging,
            cancel,
        )
        .await
    }

    async fn get_nat_rule(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<NatRule>> {
        self.get_by_id("network/natRule", id, cancel).await
    }
}

/// Factory for creating CloudControl clients
#[derive(Debug, Clone, Default)]
pub struct CloudControlClientFactory {
    config: ClientConfig,
}

impl CloudControlClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for CloudControlClientFactory {
    fn create(&self, profile: &ConnectionProfile) -> Result<Arc<dyn CloudControlApi>> {
        let client = CloudControlClient::new(profile, &self.config)?;
        tracing::debug!(
            "Created CloudControl client for '{}' at {}",
            profile.name,
            client.base_url()
        );
        Ok(Arc::new(client))
    }
}
