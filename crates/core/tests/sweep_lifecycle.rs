//! Restoration sweep integration tests.
//!
//! These tests drive the restorer against a scripted release service and
//! check how the work catalog converges:
//! listing -> catalog -> sweeps -> drained (or left for the next cycle)

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use relink_core::{
    testing::{fixtures, MockReleaseService},
    AccountId, ApiResponse, ReleaseService, Restorer, RestorerConfig, RestorerError, WorkCatalog,
};

/// Test helper wiring a mock service into a restorer.
struct TestHarness {
    service: Arc<MockReleaseService>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            service: Arc::new(MockReleaseService::new()),
        }
    }

    fn restorer(&self) -> Restorer {
        self.restorer_with(RestorerConfig::immediate())
    }

    fn restorer_with(&self, config: RestorerConfig) -> Restorer {
        Restorer::new(
            config,
            Arc::clone(&self.service) as Arc<dyn ReleaseService>,
        )
    }

    async fn sweep(&self, catalog: WorkCatalog) -> WorkCatalog {
        self.restorer().run_sweep(catalog).await.catalog
    }
}

fn account(name: &str) -> AccountId {
    AccountId::from(name)
}

fn sorted_queue(catalog: &WorkCatalog, name: &str) -> Vec<String> {
    let mut codes: Vec<String> = catalog
        .queue(&account(name))
        .unwrap_or_default()
        .iter()
        .map(|c| c.to_string())
        .collect();
    codes.sort();
    codes
}

// =============================================================================
// Catalog building
// =============================================================================

#[tokio::test]
async fn test_catalog_merges_account_across_genres() {
    let harness = TestHarness::new();
    harness
        .service
        .set_listing(json!({
            "G1": {"A": [1, 2]},
            "G2": {"A": [3]},
        }))
        .await;

    let catalog = harness.restorer().build_catalog().await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(sorted_queue(&catalog, "A"), vec!["1", "2", "3"]);
    assert!(!catalog.contains_account(&account("G1")));
    assert!(!catalog.contains_account(&account("G2")));
}

#[tokio::test]
async fn test_catalog_build_fails_on_malformed_listing() {
    let harness = TestHarness::new();
    harness
        .service
        .set_listing_response(ApiResponse::Text("Invalid credentials".to_string()))
        .await;

    let result = harness.restorer().build_catalog().await;

    assert!(matches!(result, Err(RestorerError::MalformedListing(_))));
}

#[tokio::test]
async fn test_cycle_aborts_when_listing_unavailable() {
    let harness = TestHarness::new();
    harness.service.fail_listing("service down").await;

    let result = harness.restorer().run_cycle().await;

    assert!(matches!(result, Err(RestorerError::Gateway(_))));
    assert_eq!(harness.service.restore_count().await, 0);
}

// =============================================================================
// Sweep behavior
// =============================================================================

#[tokio::test]
async fn test_removing_absent_release_leaves_queue_unchanged() {
    let mut catalog = fixtures::catalog(&[("acc", &["A", "B"])]);

    let removed = catalog.remove_item(&account("acc"), &"Z".into());

    assert!(!removed);
    assert_eq!(sorted_queue(&catalog, "acc"), vec!["A", "B"]);
}

#[tokio::test]
async fn test_sweep_leaves_no_empty_account() {
    let harness = TestHarness::new();
    harness.service.set_reply("a1", fixtures::accepted()).await;
    harness.service.set_reply("b1", fixtures::rate_limited()).await;
    harness.service.set_failure("c2", "timeout").await;
    harness.service.set_reply("d1", fixtures::already_online()).await;

    let catalog = fixtures::catalog(&[
        ("acc-a", &["a1"]),
        ("acc-b", &["b1", "b2"]),
        ("acc-c", &["c1", "c2"]),
        ("acc-d", &["d1", "d2"]),
    ]);

    let swept = harness.sweep(catalog).await;

    for (name, queue) in swept.iter() {
        assert!(!queue.is_empty(), "account {} left with an empty queue", name);
    }
    assert!(!swept.contains_account(&account("acc-a")));
    assert!(!swept.contains_account(&account("acc-d")));
    assert_eq!(sorted_queue(&swept, "acc-b"), vec!["b1", "b2"]);
    assert_eq!(sorted_queue(&swept, "acc-c"), vec!["c2"]);
}

#[tokio::test]
async fn test_rate_limit_short_circuits_account() {
    let harness = TestHarness::new();
    harness.service.set_reply("A", fixtures::rate_limited()).await;

    let catalog = fixtures::catalog(&[("acc", &["A", "B", "C"])]);
    let swept = harness.sweep(catalog).await;

    assert_eq!(
        swept.queue(&account("acc")).unwrap(),
        fixtures::codes(&["A", "B", "C"]).as_slice()
    );
    assert_eq!(
        harness.service.recorded_restores().await,
        fixtures::codes(&["A"])
    );
}

#[tokio::test]
async fn test_rate_limit_does_not_stop_other_accounts() {
    let harness = TestHarness::new();
    harness.service.set_reply("A", fixtures::rate_limited()).await;

    let catalog = fixtures::catalog(&[("acc-1", &["A", "B"]), ("acc-2", &["C"])]);
    let output = harness.restorer().run_sweep(catalog).await;

    assert!(!output.catalog.contains_account(&account("acc-2")));
    assert_eq!(
        harness.service.recorded_restores().await,
        fixtures::codes(&["A", "C"])
    );
    assert_eq!(output.report.rate_limited_accounts, vec![account("acc-1")]);
}

#[tokio::test]
async fn test_resolved_releases_empty_and_prune_account() {
    let harness = TestHarness::new();
    harness.service.set_reply("A", fixtures::already_online()).await;
    harness.service.set_reply("B", fixtures::accepted()).await;

    let catalog = fixtures::catalog(&[("acc", &["A", "B"])]);
    let swept = harness.sweep(catalog).await;

    assert!(!swept.contains_account(&account("acc")));
    assert!(swept.is_empty());
}

#[tokio::test]
async fn test_failed_release_is_retained_and_sweep_continues() {
    let harness = TestHarness::new();
    harness.service.set_failure("A", "connection refused").await;

    let catalog = fixtures::catalog(&[("acc", &["A"]), ("other", &["B"])]);
    let output = harness.restorer().run_sweep(catalog).await;

    assert_eq!(
        output.catalog.queue(&account("acc")).unwrap(),
        fixtures::codes(&["A"]).as_slice()
    );
    assert!(!output.catalog.contains_account(&account("other")));
    assert_eq!(output.report.failed, 1);
    assert_eq!(output.report.accepted, 1);
}

#[tokio::test]
async fn test_already_requested_is_its_own_outcome() {
    let harness = TestHarness::new();
    harness
        .service
        .set_reply("A", fixtures::already_requested())
        .await;

    let catalog = fixtures::catalog(&[("acc", &["A"])]);
    let output = harness.restorer().run_sweep(catalog).await;

    assert!(output.catalog.is_empty());
    assert_eq!(output.report.already_requested, 1);
    assert_eq!(output.report.accepted, 0);
}

#[tokio::test]
async fn test_unknown_reply_counts_as_accepted() {
    let harness = TestHarness::new();
    harness
        .service
        .set_reply(
            "A",
            relink_core::testing::MockRestoreReply::Respond(ApiResponse::Text(
                "<html>maintenance</html>".to_string(),
            )),
        )
        .await;

    let catalog = fixtures::catalog(&[("acc", &["A"])]);
    let output = harness.restorer().run_sweep(catalog).await;

    assert!(output.catalog.is_empty());
    assert_eq!(output.report.accepted, 1);
}

#[tokio::test]
async fn test_pacing_pauses_after_each_request() {
    let harness = TestHarness::new();
    let config = RestorerConfig {
        min_delay_ms: 30,
        max_delay_ms: 30,
        ..RestorerConfig::immediate()
    };

    let catalog = fixtures::catalog(&[("acc", &["A", "B"])]);
    let start = Instant::now();
    let output = harness.restorer_with(config).run_sweep(catalog).await;

    assert!(output.catalog.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_no_pause_after_rate_limit_stop() {
    let harness = TestHarness::new();
    harness.service.set_reply("A", fixtures::rate_limited()).await;
    let config = RestorerConfig {
        min_delay_ms: 300,
        max_delay_ms: 300,
        ..RestorerConfig::immediate()
    };

    let catalog = fixtures::catalog(&[("acc", &["A", "B"])]);
    let start = Instant::now();
    let output = harness.restorer_with(config).run_sweep(catalog).await;

    assert!(start.elapsed() < Duration::from_millis(300));
    assert_eq!(output.report.attempted, 1);
    assert_eq!(output.report.remaining, 2);
}

// =============================================================================
// Full cycles
// =============================================================================

#[tokio::test]
async fn test_cycle_converges_over_several_sweeps() {
    let harness = TestHarness::new();
    harness
        .service
        .set_listing(fixtures::listing(&[
            ("rock", "acc-1", &["1", "2"]),
            ("jazz", "acc-2", &["3"]),
            ("pop", "acc-2", &["4"]),
        ]))
        .await;
    harness
        .service
        .set_replies(
            "2",
            vec![fixtures::rate_limited(), fixtures::already_online()],
        )
        .await;
    harness
        .service
        .set_replies("4", vec![fixtures::failure("reset"), fixtures::accepted()])
        .await;

    let report = harness.restorer().run_cycle().await.unwrap();

    assert!(report.drained());
    assert_eq!(report.initial, 4);
    assert_eq!(report.sweeps.len(), 2);
    assert_eq!(report.sweeps[0].remaining, 2);
    assert_eq!(report.sweeps[1].remaining, 0);
}

#[tokio::test]
async fn test_cycle_ends_when_a_release_keeps_failing() {
    let harness = TestHarness::new();
    harness
        .service
        .set_listing(fixtures::listing(&[("rock", "acc", &["A"])]))
        .await;
    harness.service.set_failure("A", "connection reset").await;

    let report = tokio::time::timeout(Duration::from_secs(2), harness.restorer().run_cycle())
        .await
        .expect("cycle did not end")
        .unwrap();

    assert!(!report.drained());
    assert_eq!(report.remaining, 1);
    assert_eq!(report.sweeps.len(), 3);
    assert_eq!(harness.service.restore_count().await, 3);
}

#[tokio::test]
async fn test_cycle_ends_when_an_account_stays_rate_limited() {
    let harness = TestHarness::new();
    harness
        .service
        .set_listing(fixtures::listing(&[("rock", "acc", &["A", "B"])]))
        .await;
    harness.service.set_reply("A", fixtures::rate_limited()).await;
    let config = RestorerConfig {
        max_idle_sweeps: 2,
        ..RestorerConfig::immediate()
    };

    let report = harness.restorer_with(config).run_cycle().await.unwrap();

    assert_eq!(report.sweeps.len(), 2);
    assert_eq!(report.remaining, 2);
    assert_eq!(
        harness.service.recorded_restores().await,
        fixtures::codes(&["A", "A"])
    );
}

#[tokio::test]
async fn test_stop_interrupts_wait_between_sweeps() {
    let harness = TestHarness::new();
    harness
        .service
        .set_listing(fixtures::listing(&[("rock", "acc", &["A"])]))
        .await;
    harness.service.set_reply("A", fixtures::rate_limited()).await;
    let config = RestorerConfig {
        sweep_interval_secs: 3600,
        ..RestorerConfig::immediate()
    };
    let restorer = Arc::new(harness.restorer_with(config));

    let cycle = tokio::spawn({
        let restorer = Arc::clone(&restorer);
        async move { restorer.run_cycle().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    restorer.stop();

    let report = tokio::time::timeout(Duration::from_secs(2), cycle)
        .await
        .expect("cycle ignored stop")
        .unwrap()
        .unwrap();

    assert_eq!(report.sweeps.len(), 1);
    assert_eq!(report.remaining, 1);
    assert_eq!(harness.service.restore_count().await, 1);
}
