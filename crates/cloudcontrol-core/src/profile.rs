//! Connection profiles
//!
//! A profile names a set of credentials for one CloudControl region. The
//! password is held in plaintext only in memory; the store protects it before
//! anything reaches disk.

use std::fmt;

use crate::{Error, Result};

/// A named connection to a CloudControl region
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Unique profile name
    pub name: String,

    /// Region identifier (e.g. `AU`, `NA`)
    pub region: String,

    /// User name for HTTP basic authentication
    pub user_name: String,

    /// Plaintext password
    pub password: String,

    /// Whether this is the default connection
    pub is_default: bool,
}

impl ConnectionProfile {
    /// Create a non-default profile
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        user_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            user_name: user_name.into(),
            password: password.into(),
            is_default: false,
        }
    }

    /// Mark the profile as the default
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Check that the profile can be used to build a client
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_parameter("name", "Connection name cannot be empty."));
        }
        if self.region.trim().is_empty() {
            return Err(Error::invalid_parameter("region", "Region cannot be empty."));
        }
        if self.user_name.is_empty() {
            return Err(Error::invalid_parameter("user", "User name cannot be empty."));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// Make `name` the only default profile in `profiles`
///
/// Fails with [`Error::NotFound`] and leaves every flag untouched when no
/// profile is called `name`.
pub fn set_default(profiles: &mut [ConnectionProfile], name: &str) -> Result<()> {
    if !profiles.iter().any(|profile| profile.name == name) {
        return Err(Error::NotFound(name.to_string()));
    }

    for profile in profiles.iter_mut() {
        profile.is_default = profile.name == name;
    }

    Ok(())
}
