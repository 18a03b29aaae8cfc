//! Connection profile persistence
//!
//! - [`FileProfileStore`]: JSON file with encrypted passwords
//! - [`MemoryProfileStore`]: in-process store for tests and embedding

pub mod file;
pub mod memory;

pub use file::FileProfileStore;
pub use memory::MemoryProfileStore;

use async_trait::async_trait;

use crate::profile::ConnectionProfile;

/// Trait for connection profile stores
///
/// A store always reads and writes the whole profile set. Implementations
/// must be safe to call from multiple tasks.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load every persisted profile with its password in plaintext
    ///
    /// A store that has never been written yields an empty list.
    async fn load(&self) -> crate::Result<Vec<ConnectionProfile>>;

    /// Replace the persisted profile set
    ///
    /// Either the whole set is written or nothing changes.
    async fn save(&self, profiles: &[ConnectionProfile]) -> crate::Result<()>;
}
