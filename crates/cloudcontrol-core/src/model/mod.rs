//! Resource models for the CloudControl API
//!
//! Records returned by the API are deserialized into the structs in this
//! module and re-serialized unchanged when emitted by commands, so a record
//! written by one command can be read back as by-object input by another.
//!
//! - [`Resource`]: common surface (kind, id, name, state) used by the poller
//! - [`Paging`] / [`PagedResult`]: page cursors for list operations
//! - [`ApiResponse`]: the API's response envelope for mutating operations

pub mod account;
pub mod api_response;
pub mod ipv4;
pub mod network;
pub mod server;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use account::{Organization, Role, UserAccount};
pub use api_response::{ApiResponse, NameValuePair};
pub use ipv4::Ipv4Network;
pub use network::{
    EntitySummary, IpRange, NatRule, NetworkDomain, NetworkDomainEdit, NetworkDomainType,
    NewNetworkDomain, NewVlan, Vlan, VlanEdit, VlanGatewayAddressing,
};
pub use server::{Server, ServerCpu, ServerNetworkInfo, ServerNic};

/// Well-known values of a resource's `state` field
pub mod state {
    pub const NORMAL: &str = "NORMAL";
    pub const PENDING_ADD: &str = "PENDING_ADD";
    pub const PENDING_CHANGE: &str = "PENDING_CHANGE";
    pub const PENDING_DELETE: &str = "PENDING_DELETE";
    pub const FAILED_ADD: &str = "FAILED_ADD";
    pub const FAILED_CHANGE: &str = "FAILED_CHANGE";
    pub const FAILED_DELETE: &str = "FAILED_DELETE";
    pub const REQUIRES_SUPPORT: &str = "REQUIRES_SUPPORT";
}

/// Kinds of remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    UserAccount,
    NetworkDomain,
    Vlan,
    Server,
    NatRule,
}

impl ResourceKind {
    /// Type name used in error identifiers (e.g. `CloudControl.Vlan.NotFound`)
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::UserAccount => "UserAccount",
            ResourceKind::NetworkDomain => "NetworkDomain",
            ResourceKind::Vlan => "Vlan",
            ResourceKind::Server => "Server",
            ResourceKind::NatRule => "NatRule",
        }
    }

    /// Description of the container a resource of this kind lives in
    pub fn parent_description(&self) -> &'static str {
        match self {
            ResourceKind::UserAccount => "organization",
            ResourceKind::NetworkDomain => "datacenter",
            ResourceKind::Vlan | ResourceKind::Server | ResourceKind::NatRule => "network domain",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            ResourceKind::UserAccount => "user account",
            ResourceKind::NetworkDomain => "network domain",
            ResourceKind::Vlan => "VLAN",
            ResourceKind::Server => "server",
            ResourceKind::NatRule => "NAT rule",
        };
        f.write_str(description)
    }
}

/// A remote entity identified by an id and carrying a state field
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Kind of this resource
    const KIND: ResourceKind;

    /// Key holding the item array in a list response (e.g. `"vlan"`)
    const COLLECTION_KEY: &'static str;

    /// Resource id
    fn id(&self) -> &str;

    /// Resource name
    fn name(&self) -> &str;

    /// Current state (e.g. `NORMAL`, `PENDING_ADD`)
    fn state(&self) -> &str;
}

/// Page selection for list operations (page numbers start at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_size: u32,
    pub page_number: u32,
}

impl Paging {
    /// Largest page size the API accepts
    pub const MAX_PAGE_SIZE: u32 = 250;

    /// First page with the given size
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
            page_number: 1,
        }
    }

    /// Convert "take `first`, skipping `skip`" into a page selection
    ///
    /// Returns `None` when `first` is 0 (no paging requested). Skip 0 is page 1.
    pub fn from_first_skip(first: u32, skip: u32) -> Option<Self> {
        if first == 0 {
            return None;
        }

        Some(Self {
            page_size: first.min(Self::MAX_PAGE_SIZE),
            page_number: skip / first + 1,
        })
    }

    /// Query-string parameters for this page
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("pageSize", self.page_size.to_string()),
            ("pageNumber", self.page_number.to_string()),
        ]
    }
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_count: u32,
    pub total_count: u32,
    pub page_size: u32,
}

impl<T: Resource> PagedResult<T> {
    /// Parse a list response body
    ///
    /// The items live under [`Resource::COLLECTION_KEY`]; a missing key is an
    /// empty page rather than an error.
    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        // Counts past u32::MAX saturate
        let number = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_u64())
                .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
        };

        let page_number = number("pageNumber");
        let page_count = number("pageCount");
        let total_count = number("totalCount");
        let page_size = number("pageSize");

        let items = match value.get(T::COLLECTION_KEY) {
            Some(items) => serde_json::from_value(items.clone())?,
            None => Vec::new(),
        };

        Ok(Self {
            items,
            page_number,
            page_count,
            total_count,
            page_size,
        })
    }
}

impl<T> PagedResult<T> {
    /// Cursor for the page after this one, if any
    pub fn next_page(&self) -> Option<Paging> {
        if self.page_number == 0 || self.page_number >= self.page_count {
            return None;
        }

        Some(Paging {
            page_size: self.page_size.max(1),
            page_number: self.page_number + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_skip_to_page() {
        assert_eq!(Paging::from_first_skip(0, 10), None);
        assert_eq!(
            Paging::from_first_skip(10, 0),
            Some(Paging {
                page_size: 10,
                page_number: 1
            })
        );
        assert_eq!(
            Paging::from_first_skip(10, 25),
            Some(Paging {
                page_size: 10,
                page_number: 3
            })
        );
    }

    #[test]
    fn test_paged_result_cursor() {
        let body = json!({
            "vlan": [{
                "id": "v-1",
                "name": "web",
                "networkDomain": { "id": "nd-1", "name": "prod" },
                "privateIpv4Range": { "address": "10.0.0.0", "prefixSize": 24 },
                "state": "NORMAL"
            }],
            "pageNumber": 1,
            "pageCount": 2,
            "totalCount": 2,
            "pageSize": 1
        });

        let page: PagedResult<Vlan> = PagedResult::from_json(body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "web");
        assert_eq!(
            page.next_page(),
            Some(Paging {
                page_size: 1,
                page_number: 2
            })
        );
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let body = json!({ "pageNumber": 2, "pageCount": 2, "totalCount": 3, "pageSize": 2 });
        let page: PagedResult<NatRule> = PagedResult::from_json(body).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn test_oversized_counts_saturate() {
        let body = json!({
            "pageNumber": 1,
            "pageCount": 1,
            "totalCount": u64::from(u32::MAX) + 5,
            "pageSize": 250
        });
        let page: PagedResult<NatRule> = PagedResult::from_json(body).unwrap();
        assert_eq!(page.total_count, u32::MAX);
        assert_eq!(page.page_size, 250);
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn test_kind_descriptions() {
        assert_eq!(ResourceKind::NetworkDomain.to_string(), "network domain");
        assert_eq!(ResourceKind::NatRule.type_name(), "NatRule");
        assert_eq!(ResourceKind::Vlan.parent_description(), "network domain");
    }
}
