//! Contract Test: Resource State Polling
//!
//! Constraints verified:
//! - Polling stops as soon as the target state is observed
//! - Timeouts are honoured promptly
//! - Cancellation during a sleep ends polling with no further fetches
//! - The poller works through `dyn CloudControlApi`
//!
//! If this test fails, `--wait-for` commands may hang or return early.

mod common;

use common::*;
use cloudcontrol_core::model::Vlan;
use cloudcontrol_core::{CloudControlApi, Error, ResourceStatePoller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn poller() -> ResourceStatePoller {
    ResourceStatePoller::default()
        .with_interval(Duration::from_millis(10))
        .with_not_found_grace(Duration::from_secs(5))
}

#[tokio::test]
async fn reaches_state_on_third_fetch() {
    let api = Arc::new(FakeCloudApi::new("AU"));
    api.script_vlan("v-1", &["PENDING_ADD", "PENDING_ADD", "NORMAL"]);
    let client: Arc<dyn CloudControlApi> = api.clone();

    let vlan: Vlan = poller()
        .wait_for_state(&*client, "v-1", "NORMAL", Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(vlan.state, "NORMAL");
    assert_eq!(api.get_call_count(), 3);
}

#[tokio::test]
async fn times_out_promptly() {
    let api = Arc::new(FakeCloudApi::new("AU"));
    api.script_vlan("v-1", &["PENDING_ADD"]);
    let client: Arc<dyn CloudControlApi> = api.clone();

    let started = Instant::now();
    let err = poller()
        .wait_for_state::<Vlan, _>(&*client, "v-1", "NORMAL", Duration::from_millis(50), &CancellationToken::new())
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        Error::Timeout { id, target_state, .. } => {
            assert_eq!(id, "v-1");
            assert_eq!(target_state, "NORMAL");
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(1), "took {:?}", elapsed);
}

#[tokio::test]
async fn never_seen_resource_times_out_as_not_found() {
    let client: Arc<dyn CloudControlApi> = Arc::new(FakeCloudApi::new("AU"));

    let err = poller()
        .wait_for_state::<Vlan, _>(&*client, "missing", "NORMAL", Duration::from_millis(40), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.error_id(), "CloudControl.Vlan.NotFound");
}

#[tokio::test]
async fn cancellation_during_sleep_stops_fetching() {
    let api = Arc::new(FakeCloudApi::new("AU"));
    api.script_vlan("v-1", &["PENDING_ADD"]);
    let client: Arc<dyn CloudControlApi> = api.clone();

    let cancel = CancellationToken::new();
    let slow_poller = ResourceStatePoller::default().with_interval(Duration::from_secs(30));

    let task = {
        let cancel = cancel.clone();
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            slow_poller
                .wait_for_state::<Vlan, _>(&*client, "v-1", "NORMAL", Duration::from_secs(60), &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("poller should stop promptly after cancellation")
        .unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(api.get_call_count(), 1);
}

#[tokio::test]
async fn cancellation_during_fetch_is_reported() {
    let api = Arc::new(FakeCloudApi::new("AU").with_delay(Duration::from_secs(30)));
    api.script_vlan("v-1", &["NORMAL"]);
    let client: Arc<dyn CloudControlApi> = api.clone();

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let err = poller()
        .wait_for_state::<Vlan, _>(&*client, "v-1", "NORMAL", Duration::from_secs(60), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
