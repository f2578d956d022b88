mod common;

use common::{context, index_page, MockFetcher, MockResponse, INDEX_URL};
use lcdscan_core::{AppConfig, LinkHarvestConfig, RangeSpec, RefineConfig, StrategyKind};
use lcdscan_scanner::{DiscoveryOrchestrator, LinkHarvest, RangeProbe, SeededValidation};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn harvest(index: &str) -> LinkHarvest {
    LinkHarvest::new(LinkHarvestConfig {
        index_pages: vec![index.to_string()],
        ..LinkHarvestConfig::default()
    })
}

fn range_probe(start: u64, end: u64, stride: u64) -> RangeProbe {
    RangeProbe::new(
        vec![RangeSpec::new(start, end, stride)],
        RefineConfig {
            max_depth: 0,
            ..RefineConfig::default()
        },
    )
}

#[tokio::test]
async fn test_run_merges_strategies_with_provenance() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(33822, "Glucose Monitors");
    fetcher.valid_policy(33850, "Oxygen Equipment");
    fetcher.respond(INDEX_URL, index_page(&[33822, 34001], None));

    let orchestrator = DiscoveryOrchestrator::new(context(fetcher.clone()))
        .with_strategy(SeededValidation::from_ids(&[33822]).unwrap())
        .with_strategy(harvest(INDEX_URL))
        .with_strategy(range_probe(33800, 33900, 50));

    let summary = orchestrator.run().await;
    let catalog = &summary.catalog;

    let ids: Vec<u64> = catalog.policies().iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![33822, 33850, 34001]);
    assert_eq!(catalog.policies()[0].strategy, StrategyKind::SeededValidation);
    assert_eq!(catalog.policies()[1].strategy, StrategyKind::RangeProbe);
    assert_eq!(catalog.policies()[2].strategy, StrategyKind::LinkHarvest);

    let breakdown = catalog.strategy_breakdown();
    assert_eq!(breakdown.get(&StrategyKind::SeededValidation), Some(&1));
    assert_eq!(breakdown.get(&StrategyKind::LinkHarvest), Some(&1));
    assert_eq!(breakdown.get(&StrategyKind::RangeProbe), Some(&1));

    assert_eq!(
        summary.strategies(),
        vec![
            StrategyKind::SeededValidation,
            StrategyKind::LinkHarvest,
            StrategyKind::RangeProbe
        ]
    );
    assert!(summary.reports.iter().all(|r| r.succeeded()));
    assert!(!summary.cancelled);
    assert_eq!(summary.duplicates_dropped, 1);

    // 33822 was claimed by seeding and never fetched again
    let seeded_url = common::record_url(33822);
    assert_eq!(
        fetcher.calls().iter().filter(|url| **url == seeded_url).count(),
        1
    );
}

#[tokio::test]
async fn test_adding_a_strategy_never_removes_a_record() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.respond(INDEX_URL, index_page(&[34001], None));

    let alone = DiscoveryOrchestrator::new(context(fetcher.clone()))
        .with_strategy(harvest(INDEX_URL))
        .run()
        .await;
    assert_eq!(alone.catalog.total(), 1);

    // The record page for 34001 is the error page, so seeding probes it as not found.
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.respond(INDEX_URL, index_page(&[34001], None));
    let combined = DiscoveryOrchestrator::new(context(fetcher.clone()))
        .with_strategy(SeededValidation::from_ids(&[34001]).unwrap())
        .with_strategy(harvest(INDEX_URL))
        .run()
        .await;

    assert_eq!(combined.catalog.total(), 1);
    let record = &combined.catalog.policies()[0];
    assert_eq!(record.id.get(), 34001);
    assert_eq!(record.strategy, StrategyKind::LinkHarvest);
    let seeded = combined.report(StrategyKind::SeededValidation).unwrap();
    assert_eq!(seeded.stats.not_found, 1);
    assert_eq!(seeded.records, 0);
}

#[tokio::test]
async fn test_failing_strategy_does_not_abort_run() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(33822, "Glucose Monitors");
    fetcher.valid_policy(35050, "Molecular Pathology");
    fetcher.respond(
        INDEX_URL,
        MockResponse::Page {
            title: "Reports".to_string(),
            html: "<html><body>No results</body></html>".to_string(),
        },
    );

    let orchestrator = DiscoveryOrchestrator::new(context(fetcher.clone()))
        .with_strategy(SeededValidation::from_ids(&[33822]).unwrap())
        .with_strategy(harvest(INDEX_URL))
        .with_strategy(range_probe(35000, 35100, 50));

    let summary = orchestrator.run().await;

    assert_eq!(summary.catalog.total(), 2);
    let report = summary.report(StrategyKind::LinkHarvest).unwrap();
    assert!(report.failure.is_some());
    assert!(!report.cancelled);
    assert!(summary.report(StrategyKind::RangeProbe).unwrap().succeeded());
}

#[tokio::test]
async fn test_invalid_range_fails_only_its_strategy() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(33822, "Glucose Monitors");

    let orchestrator = DiscoveryOrchestrator::new(context(fetcher.clone()))
        .with_strategy(SeededValidation::from_ids(&[33822]).unwrap())
        .with_strategy(range_probe(34000, 33000, 50));

    tokio_test::assert_err!(orchestrator.validate());

    let summary = orchestrator.run().await;
    assert_eq!(summary.catalog.total(), 1);
    let report = summary.report(StrategyKind::RangeProbe).unwrap();
    assert!(report.failure.as_deref().unwrap().contains("invalid search range"));
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_cancelled_run_issues_no_probes() {
    let fetcher = Arc::new(MockFetcher::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let ctx = context(fetcher.clone()).with_cancellation(cancel);
    let orchestrator = DiscoveryOrchestrator::new(ctx)
        .with_strategy(SeededValidation::from_ids(&[33822]).unwrap())
        .with_strategy(harvest(INDEX_URL))
        .with_strategy(range_probe(33000, 34000, 50));

    let summary = orchestrator.run().await;

    assert!(summary.cancelled);
    assert!(summary.catalog.is_empty());
    assert!(summary.reports.iter().all(|r| r.cancelled));
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_cancellation_stops_new_probes_mid_run() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(30000, "Early hit");
    let cancel = CancellationToken::new();
    fetcher.cancel_after(5, cancel.clone());

    let ctx = context(fetcher.clone()).with_cancellation(cancel);
    let orchestrator =
        DiscoveryOrchestrator::new(ctx).with_strategy(range_probe(30000, 31000, 1));

    let summary = orchestrator.run().await;

    assert!(summary.cancelled);
    assert!(fetcher.call_count() < 20);
    assert_eq!(summary.catalog.total(), 1);
    assert!(summary.report(StrategyKind::RangeProbe).unwrap().cancelled);
}

#[test]
fn test_from_config_follows_enabled_order() {
    let mut config = AppConfig::default();
    config.strategies.enabled = vec![
        StrategyKind::RangeProbe,
        StrategyKind::SeededValidation,
        StrategyKind::RangeProbe,
    ];

    let fetcher = Arc::new(MockFetcher::new());
    let orchestrator =
        DiscoveryOrchestrator::from_config(&config, context(fetcher), true).unwrap();

    assert_eq!(
        orchestrator.strategies(),
        vec![StrategyKind::RangeProbe, StrategyKind::SeededValidation]
    );
    tokio_test::assert_ok!(orchestrator.validate());
}
