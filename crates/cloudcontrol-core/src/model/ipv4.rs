//! IPv4 network arithmetic used when expanding VLANs

use std::fmt;
use std::net::Ipv4Addr;

use crate::{Error, Result};

/// An IPv4 network described by a base address and prefix size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Network {
    base: Ipv4Addr,
    prefix_size: u8,
}

impl Ipv4Network {
    /// Create a network; the prefix size must be between 1 and 31
    pub fn new(base: Ipv4Addr, prefix_size: u8) -> Result<Self> {
        if !(1..=31).contains(&prefix_size) {
            return Err(Error::invalid_parameter(
                "prefix_size",
                format!(
                    "IPv4 network prefix size must be between 1 and 31 (got {}).",
                    prefix_size
                ),
            ));
        }

        Ok(Self { base, prefix_size })
    }

    /// Parse the base address from a string
    pub fn parse(base: &str, prefix_size: u8) -> Result<Self> {
        let base: Ipv4Addr = base.parse().map_err(|_| {
            Error::invalid_parameter("base_address", format!("'{}' is not an IPv4 address.", base))
        })?;

        Self::new(base, prefix_size)
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    pub fn prefix_size(&self) -> u8 {
        self.prefix_size
    }

    fn mask(&self) -> u32 {
        u32::MAX << (32 - self.prefix_size)
    }

    /// First address in the network
    pub fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.base) & self.mask())
    }

    /// Last address in the network
    pub fn end(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.base) | !self.mask())
    }

    /// The same base address with a different prefix size
    pub fn with_prefix_size(&self, prefix_size: u8) -> Result<Self> {
        Self::new(self.base, prefix_size)
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}-{})",
            self.base,
            self.prefix_size,
            self.start(),
            self.end()
        )
    }
}
