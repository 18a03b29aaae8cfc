// # cloudcontrol-core
//
// Core library for the CloudControl command surface.
//
// ## Architecture Overview
//
// - **ConnectionProfile / ProfileStore**: named connections, persisted with
//   encrypted passwords
// - **CredentialProtector**: purpose-scoped AES-256-GCM protection of secrets
// - **ConnectionSession**: shared context owning profiles and API clients
// - **CloudControlApi**: remote calls; implemented by `cloudcontrol-client`
// - **ResourceStatePoller**: waits for a resource to reach a target state
// - **Target**: how a command names the resource it acts on
//
// ## Design Principles
//
// 1. **Library-First**: commands are thin; everything testable lives here
// 2. **Injected context**: stores, factories and sessions are constructed and
//    passed explicitly
// 3. **Cancellable**: every remote call and wait takes a cancellation token
// 4. **No silent recovery**: a corrupt store is an error, not an empty list

pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod profile;
pub mod protect;
pub mod session;
pub mod store;
pub mod target;
pub mod traits;

// Re-export core types for convenience
pub use config::{ClientConfig, PollerConfig, Settings};
pub use error::{Error, ErrorCategory, Result};
pub use model::{Resource, ResourceKind};
pub use poller::ResourceStatePoller;
pub use profile::{set_default, ConnectionProfile};
pub use protect::{AesGcmProtector, CredentialProtector, MasterKey};
pub use session::ConnectionSession;
pub use store::{FileProfileStore, MemoryProfileStore, ProfileStore};
pub use target::{resolve_target, Target};
pub use traits::{ClientFactory, CloudControlApi, ResourceFetcher};
pub use tokio_util::sync::CancellationToken;
