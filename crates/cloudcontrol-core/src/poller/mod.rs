//! Resource state poller
//!
//! Waits for a remote resource to reach a target state by fetching it at a
//! fixed interval.
//!
//! ```text
//!            fetch
//!   ┌──────────────────┐
//!   ▼                  │ state differs / not found yet / transient error
//! Polling ─────────────┘
//!   │
//!   ├── state == target ──────────────► Reached(resource)
//!   ├── deadline passed ──────────────► Timeout (or NotFound if never seen)
//!   ├── never seen within grace ──────► NotFound
//!   ├── API error ────────────────────► Errored
//!   └── cancelled ────────────────────► Cancelled
//! ```
//!
//! Only the poller retries. Transport failures are retried on the next tick;
//! API error responses end polling immediately.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::model::Resource;
use crate::traits::ResourceFetcher;
use crate::{Error, Result};

/// Polls resources until they reach a target state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatePoller {
    interval: Duration,
    not_found_grace: Duration,
}

impl ResourceStatePoller {
    /// Create a poller from configuration
    pub fn new(config: &PollerConfig) -> Self {
        Self {
            interval: config.interval(),
            not_found_grace: config.not_found_grace(),
        }
    }

    /// Set the delay between fetches
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set how long a never-seen resource may stay not-found
    pub fn with_not_found_grace(mut self, grace: Duration) -> Self {
        self.not_found_grace = grace;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the resource with `id` reports `target_state`
    ///
    /// State comparison is case-sensitive. Returns the resource as last
    /// fetched. The timeout is measured from the first fetch; the sleep before
    /// the last fetch is shortened so that fetch happens at the deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`]: the resource was seen but never in `target_state`
    /// - [`Error::ResourceNotFoundById`]: the resource was never seen within
    ///   the not-found grace period or the timeout
    /// - [`Error::Cancelled`]: `cancel` fired before a fetch or during a sleep
    /// - any non-transient error returned by the fetcher
    pub async fn wait_for_state<R, F>(
        &self,
        fetcher: &F,
        id: &str,
        target_state: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<R>
    where
        R: Resource,
        F: ResourceFetcher<R> + ?Sized,
    {
        let started = Instant::now();
        let mut observed = false;
        let mut attempt: u32 = 0;

        info!(
            "Waiting up to {:?} for {} '{}' to reach state '{}'",
            timeout,
            R::KIND,
            id,
            target_state
        );

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            attempt += 1;
            match fetcher.fetch(id, cancel).await {
                Ok(Some(resource)) => {
                    observed = true;
                    if resource.state() == target_state {
                        info!(
                            "{} '{}' reached state '{}' after {} fetch(es)",
                            R::KIND,
                            id,
                            target_state,
                            attempt
                        );
                        return Ok(resource);
                    }
                    debug!(
                        "{} '{}' is in state '{}' (attempt {})",
                        R::KIND,
                        id,
                        resource.state(),
                        attempt
                    );
                }
                Ok(None) => {
                    if !observed && started.elapsed() >= self.not_found_grace {
                        return Err(Error::not_found_by_id(R::KIND, id));
                    }
                    debug!("{} '{}' not found yet (attempt {})", R::KIND, id, attempt);
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) if e.is_transient() => {
                    warn!(
                        "Fetch attempt {} for {} '{}' failed: {}",
                        attempt,
                        R::KIND,
                        id,
                        e
                    );
                }
                Err(e) => return Err(e),
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                if !observed {
                    return Err(Error::not_found_by_id(R::KIND, id));
                }
                return Err(Error::Timeout {
                    kind: R::KIND,
                    id: id.to_string(),
                    target_state: target_state.to_string(),
                    timeout,
                });
            }

            let delay = self.interval.min(timeout - elapsed);
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl Default for ResourceStatePoller {
    fn default() -> Self {
        Self::new(&PollerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntitySummary, IpRange, Vlan};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the scripted responses in order, repeating the last one
    struct ScriptedFetcher {
        script: Mutex<Vec<Result<Option<Vlan>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<Option<Vlan>>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn clone_result(result: &Result<Option<Vlan>>) -> Result<Option<Vlan>> {
        match result {
            Ok(vlan) => Ok(vlan.clone()),
            Err(Error::Http(msg)) => Err(Error::http(msg.clone())),
            Err(Error::Api { response_code, message, .. }) => {
                Err(Error::api(response_code.clone(), message.clone()))
            }
            Err(e) => Err(Error::config(e.to_string())),
        }
    }

    #[async_trait]
    impl ResourceFetcher<Vlan> for ScriptedFetcher {
        async fn fetch(&self, _id: &str, _cancel: &CancellationToken) -> Result<Option<Vlan>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let script = self.script.lock().unwrap();
            let index = call.min(script.len() - 1);
            clone_result(&script[index])
        }
    }

    fn vlan(state: &str) -> Option<Vlan> {
        Some(Vlan {
            id: "v-1".to_string(),
            network_domain: EntitySummary {
                id: "nd-1".to_string(),
                name: "prod".to_string(),
            },
            name: "web".to_string(),
            description: None,
            private_ipv4_range: IpRange {
                address: "10.0.0.0".to_string(),
                prefix_size: 24,
            },
            ipv4_gateway_address: None,
            ipv6_range: None,
            ipv6_gateway_address: None,
            gateway_addressing: None,
            create_time: None,
            state: state.to_string(),
            datacenter_id: None,
        })
    }

    fn fast_poller() -> ResourceStatePoller {
        ResourceStatePoller::default()
            .with_interval(Duration::from_millis(10))
            .with_not_found_grace(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_returns_on_first_match() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vlan("NORMAL"))]);
        let result: Vlan = fast_poller()
            .wait_for_state(&fetcher, "v-1", "NORMAL", Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.state, "NORMAL");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_state_comparison_is_case_sensitive() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vlan("normal"))]);
        let err = fast_poller()
            .wait_for_state::<Vlan, _>(&fetcher, "v-1", "NORMAL", Duration::from_millis(40), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(Error::http("connection reset")),
            Ok(vlan("PENDING_ADD")),
            Ok(vlan("NORMAL")),
        ]);

        let result: Vlan = fast_poller()
            .wait_for_state(&fetcher, "v-1", "NORMAL", Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.state, "NORMAL");
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_api_errors_end_polling() {
        let fetcher = ScriptedFetcher::new(vec![Err(Error::api("UNEXPECTED_ERROR", "boom"))]);
        let err = fast_poller()
            .wait_for_state::<Vlan, _>(&fetcher, "v-1", "NORMAL", Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { .. }));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_never_found_within_grace() {
        let fetcher = ScriptedFetcher::new(vec![Ok(None)]);
        let err = fast_poller()
            .with_not_found_grace(Duration::from_millis(30))
            .wait_for_state::<Vlan, _>(&fetcher, "v-1", "NORMAL", Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ResourceNotFoundById { ref id, .. } if id == "v-1"));
        assert!(fetcher.calls() >= 2);
    }

    #[tokio::test]
    async fn test_late_appearance_within_grace() {
        let fetcher = ScriptedFetcher::new(vec![Ok(None), Ok(None), Ok(vlan("NORMAL"))]);
        let result: Vlan = fast_poller()
            .wait_for_state(&fetcher, "v-1", "NORMAL", Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.id, "v-1");
    }

    #[tokio::test]
    async fn test_cancelled_before_first_fetch() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vlan("NORMAL"))]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fast_poller()
            .wait_for_state::<Vlan, _>(&fetcher, "v-1", "NORMAL", Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(fetcher.calls(), 0);
    }
}
