//! Connection session
//!
//! A [`ConnectionSession`] is the per-process context commands share. It owns
//! the known connection profiles and one API client per connection name, both
//! behind a single mutex.
//!
//! ## Profiles
//!
//! Persisted profiles are merged into the session on access: a profile read
//! from the store replaces the session's profile with the same name, and
//! profiles only the session knows are kept. A default read from the store
//! replaces the session's default. Mutations are applied to a copy, written
//! back to the store, and only then become visible in the session.
//!
//! ## Clients
//!
//! Clients are created lazily through a [`ClientFactory`]. The lock is held
//! while a client is created, so concurrent resolution of the same name never
//! builds two clients.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::profile::{self, ConnectionProfile};
use crate::store::ProfileStore;
use crate::traits::{ClientFactory, CloudControlApi};
use crate::{Error, Result};

type Connections = HashMap<String, ConnectionProfile>;

#[derive(Default)]
struct SessionState {
    connections: Connections,
    clients: HashMap<String, Arc<dyn CloudControlApi>>,
}

/// Shared connection context for commands
pub struct ConnectionSession {
    store: Arc<dyn ProfileStore>,
    factory: Arc<dyn ClientFactory>,
    state: Mutex<SessionState>,
}

impl ConnectionSession {
    /// Create a session over a profile store and a client factory
    pub fn new(store: Arc<dyn ProfileStore>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            store,
            factory,
            state: Mutex::new(SessionState::default()),
        }
    }

    async fn merge_persisted(&self, state: &mut SessionState) -> Result<()> {
        for profile in self.store.load().await? {
            // Last default read wins
            if profile.is_default {
                for other in state.connections.values_mut() {
                    other.is_default = false;
                }
            }
            state.connections.insert(profile.name.clone(), profile);
        }
        Ok(())
    }

    async fn persist(&self, connections: &Connections) -> Result<()> {
        let profiles: Vec<ConnectionProfile> = connections.values().cloned().collect();
        self.store.save(&profiles).await
    }

    fn sorted(connections: &Connections) -> Vec<ConnectionProfile> {
        let mut profiles: Vec<ConnectionProfile> = connections.values().cloned().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    /// Merge the persisted profiles into the session
    pub async fn read_connections(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await
    }

    /// Write the session's profiles to the store
    pub async fn write_connections(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.persist(&state.connections).await
    }

    /// All known profiles, sorted by name
    pub async fn connections(&self) -> Result<Vec<ConnectionProfile>> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;
        Ok(Self::sorted(&state.connections))
    }

    /// The profile called `name`, if any
    pub async fn connection(&self, name: &str) -> Result<Option<ConnectionProfile>> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;
        Ok(state.connections.get(name).cloned())
    }

    /// Name of the default profile, if one is configured
    pub async fn default_connection_name(&self) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;
        Ok(state
            .connections
            .values()
            .find(|profile| profile.is_default)
            .map(|profile| profile.name.clone()))
    }

    /// Add a new profile and persist it
    ///
    /// The profile becomes the default when `make_default` is set or when no
    /// other profile is the default yet.
    pub async fn add_connection(
        &self,
        profile: ConnectionProfile,
        make_default: bool,
    ) -> Result<ConnectionProfile> {
        profile.validate()?;

        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;

        if state.connections.contains_key(&profile.name) {
            return Err(Error::ConnectionExists(profile.name));
        }

        let name = profile.name.clone();
        let has_default = state.connections.values().any(|p| p.is_default);
        let mut connections = state.connections.clone();
        connections.insert(name.clone(), profile.with_default(false));

        if make_default || !has_default {
            Self::apply_default(&mut connections, &name)?;
        }

        self.persist(&connections).await?;
        let added = connections.get(&name).cloned();
        state.connections = connections;
        info!("Added connection '{}'", name);

        added.ok_or(Error::ConnectionDoesNotExist(name))
    }

    /// Remove a profile, closing its client, and persist the change
    pub async fn remove_connection(&self, name: &str) -> Result<ConnectionProfile> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;

        let mut connections = state.connections.clone();
        let removed = connections
            .remove(name)
            .ok_or_else(|| Error::ConnectionDoesNotExist(name.to_string()))?;

        self.persist(&connections).await?;
        state.connections = connections;

        if let Some(client) = state.clients.remove(name) {
            client.close();
        }
        info!("Removed connection '{}'", name);
        Ok(removed)
    }

    /// Close the client for `name`, keeping the profile
    ///
    /// Returns `true` when a client was open.
    pub async fn close_connection(&self, name: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.clients.remove(name) {
            Some(client) => {
                client.close();
                debug!("Closed client for connection '{}'", name);
                true
            }
            None => false,
        }
    }

    /// Make `name` the only default profile and persist the change
    pub async fn set_default_connection(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;
        let mut connections = state.connections.clone();
        Self::apply_default(&mut connections, name)?;
        self.persist(&connections).await?;
        state.connections = connections;
        info!("Default connection is now '{}'", name);
        Ok(())
    }

    fn apply_default(connections: &mut Connections, name: &str) -> Result<()> {
        let mut profiles = Self::sorted(connections);
        profile::set_default(&mut profiles, name).map_err(|e| match e {
            Error::NotFound(name) => Error::ConnectionDoesNotExist(name),
            other => other,
        })?;

        *connections = profiles
            .into_iter()
            .map(|profile| (profile.name.clone(), profile))
            .collect();
        Ok(())
    }

    /// Resolve the client for a connection
    ///
    /// With no `name` the default connection is used. `command` names the
    /// caller for the error raised when there is no default.
    pub async fn client(
        &self,
        name: Option<&str>,
        command: &str,
    ) -> Result<Arc<dyn CloudControlApi>> {
        let mut state = self.state.lock().await;
        self.merge_persisted(&mut state).await?;

        let name = match name {
            Some(name) => name.to_string(),
            None => state
                .connections
                .values()
                .find(|profile| profile.is_default)
                .map(|profile| profile.name.clone())
                .ok_or_else(|| Error::connection_required(command))?,
        };

        if let Some(client) = state.clients.get(&name)
            && !client.is_closed()
        {
            return Ok(Arc::clone(client));
        }

        let profile = state
            .connections
            .get(&name)
            .ok_or_else(|| Error::ConnectionDoesNotExist(name.clone()))?;

        let client = self.factory.create(profile)?;
        debug!(
            "Created client for connection '{}' (region {})",
            name,
            client.region()
        );
        state.clients.insert(name, Arc::clone(&client));
        Ok(client)
    }

    /// Close every open client
    pub async fn close_all(&self) {
        let mut state = self.state.lock().await;
        for (name, client) in state.clients.drain() {
            client.close();
            debug!("Closed client for connection '{}'", name);
        }
    }
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession").finish_non_exhaustive()
    }
}
