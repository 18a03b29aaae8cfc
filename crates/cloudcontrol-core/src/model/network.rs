//! Network resources: network domains, VLANs and NAT rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};

/// Network domain service level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkDomainType {
    #[default]
    Essentials,
    Advanced,
}

/// Which end of a VLAN's range holds the gateway address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VlanGatewayAddressing {
    #[default]
    Low,
    High,
}

/// Id and name of a related entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// An IP network (base address and prefix size)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpRange {
    pub address: String,
    pub prefix_size: u8,
}

/// A network domain, the top-level container for resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDomain {
    pub id: String,
    #[serde(default)]
    pub datacenter_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub domain_type: NetworkDomainType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snat_ipv4_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    pub state: String,
}

impl Resource for NetworkDomain {
    const KIND: ResourceKind = ResourceKind::NetworkDomain;
    const COLLECTION_KEY: &'static str = "networkDomain";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &str {
        &self.state
    }
}

/// A VLAN within a network domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub id: String,
    pub network_domain: EntitySummary,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private_ipv4_range: IpRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_gateway_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_range: Option<IpRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_gateway_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_addressing: Option<VlanGatewayAddressing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<String>,
}

impl Resource for Vlan {
    const KIND: ResourceKind = ResourceKind::Vlan;
    const COLLECTION_KEY: &'static str = "vlan";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &str {
        &self.state
    }
}

/// A NAT rule mapping an external address to an internal one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatRule {
    pub id: String,
    pub network_domain_id: String,
    pub internal_ip: String,
    pub external_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<String>,
}

impl Resource for NatRule {
    const KIND: ResourceKind = ResourceKind::NatRule;
    const COLLECTION_KEY: &'static str = "natRule";

    fn id(&self) -> &str {
        &self.id
    }

    // NAT rules are unnamed; the internal address identifies them to people.
    fn name(&self) -> &str {
        &self.internal_ip
    }

    fn state(&self) -> &str {
        &self.state
    }
}

/// Request body for deploying a network domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNetworkDomain {
    pub datacenter_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub domain_type: NetworkDomainType,
}

/// Request body for editing a network domain (absent fields are unchanged)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDomainEdit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<NetworkDomainType>,
}

/// Request body for deploying a VLAN
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVlan {
    pub network_domain_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private_ipv4_base_address: String,
    pub private_ipv4_prefix_size: u8,
    pub gateway_addressing: VlanGatewayAddressing,
}

/// Request body for editing a VLAN (absent fields are unchanged)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanEdit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_domain_from_api_json() {
        let domain: NetworkDomain = serde_json::from_value(json!({
            "id": "8cdfd607-f429-4df6-9352-162cfc0891be",
            "datacenterId": "AU9",
            "name": "Production",
            "description": "Prod network",
            "type": "ADVANCED",
            "snatIpv4Address": "168.128.3.44",
            "createTime": "2016-06-09T07:00:00.000Z",
            "state": "NORMAL"
        }))
        .unwrap();

        assert_eq!(domain.domain_type, NetworkDomainType::Advanced);
        assert_eq!(domain.datacenter_id, "AU9");
        assert!(domain.create_time.is_some());
        assert_eq!(domain.state(), "NORMAL");
    }

    #[test]
    fn test_edit_omits_unchanged_fields() {
        let edit = NetworkDomainEdit {
            id: "nd-1".to_string(),
            name: Some("renamed".to_string()),
            description: None,
            domain_type: None,
        };

        assert_eq!(
            serde_json::to_value(&edit).unwrap(),
            json!({ "id": "nd-1", "name": "renamed" })
        );
    }

    #[test]
    fn test_new_vlan_body() {
        let body = NewVlan {
            network_domain_id: "nd-1".to_string(),
            name: "web".to_string(),
            description: None,
            private_ipv4_base_address: "10.0.3.0".to_string(),
            private_ipv4_prefix_size: 24,
            gateway_addressing: VlanGatewayAddressing::High,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["privateIpv4PrefixSize"], 24);
        assert_eq!(value["gatewayAddressing"], "HIGH");
        assert!(value.get("description").is_none());
    }
}
