//! Response envelope returned by mutating API operations
//!
//! ```json
//! {
//!   "operation": "DEPLOY_VLAN",
//!   "responseCode": "IN_PROGRESS",
//!   "message": "Request to deploy VLAN 'web' has been accepted.",
//!   "info": [{ "name": "vlanId", "value": "0e56433f-d808-4669-821d-812769517ff8" }],
//!   "requestId": "au_20160609T070000Z_1a2b3c"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub operation: String,
    pub response_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<NameValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warning: Vec<NameValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<NameValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiResponse {
    pub const OK: &'static str = "OK";
    pub const IN_PROGRESS: &'static str = "IN_PROGRESS";
    pub const RESOURCE_NOT_FOUND: &'static str = "RESOURCE_NOT_FOUND";

    /// Whether the operation was accepted
    pub fn is_success(&self) -> bool {
        self.response_code == Self::OK || self.response_code == Self::IN_PROGRESS
    }

    /// Look up a value in the `info` list (e.g. the id of a new resource)
    pub fn info_value(&self, name: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|pair| pair.name == name)
            .map(|pair| pair.value.as_str())
    }

    /// Turn a non-success response into an [`Error::Api`]
    pub fn into_result(self) -> crate::Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(self.into_error())
    }

    /// The [`Error::Api`] describing this response, whatever its code
    pub fn into_error(self) -> Error {
        Error::Api {
            response_code: self.response_code,
            message: self.message,
            operation: Some(self.operation).filter(|op| !op.is_empty()),
            request_id: self.request_id,
        }
    }
}
