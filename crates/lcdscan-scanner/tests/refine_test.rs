mod common;

use common::{context, record_url, MockFetcher};
use lcdscan_core::{PolicyId, RefineConfig, StrategyKind};
use lcdscan_scanner::{DensityRefiner, RangeScanner, SearchRange};
use std::collections::HashSet;
use std::sync::Arc;

fn refine_config(max_depth: u32) -> RefineConfig {
    RefineConfig {
        density_threshold: 0.05,
        max_depth,
        refinement_factor: 5,
    }
}

#[tokio::test]
async fn test_scan_emits_only_valid_records() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(33000, "Glucose Monitors");
    fetcher.valid_policy(33100, "Oxygen Equipment");
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(33000, 33200, 50).unwrap();
    let scan = RangeScanner::new(&ctx, StrategyKind::RangeProbe)
        .scan(&range)
        .await;

    let ids: Vec<u64> = scan.records.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![33000, 33100]);
    assert_eq!(scan.stats.probed, 4);
    assert_eq!(scan.stats.hits, 2);
    assert_eq!(scan.stats.not_found, 2);
    assert_eq!(fetcher.call_count(), 4);
    assert_eq!(scan.records[0].title, "Glucose Monitors");
    assert_eq!(scan.records[0].doc_id.as_str(), "L33000");
    assert_eq!(scan.records[0].url, record_url(33000));
    assert_eq!(scan.records[0].strategy, StrategyKind::RangeProbe);
}

#[tokio::test]
async fn test_scan_skips_processed_identifiers() {
    let fetcher = Arc::new(MockFetcher::new());
    let ctx = context(fetcher.clone());
    assert!(ctx.processed().claim(PolicyId::new(33050).unwrap()));

    let range = SearchRange::new(33000, 33200, 50).unwrap();
    let scan = RangeScanner::new(&ctx, StrategyKind::RangeProbe)
        .scan(&range)
        .await;

    assert_eq!(scan.stats.already_processed, 1);
    assert_eq!(fetcher.call_count(), 3);
    assert!(!fetcher.calls().contains(&record_url(33050)));
}

#[tokio::test]
async fn test_failed_fetch_is_skipped_and_released() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.fail_policy(33050);
    fetcher.valid_policy(33100, "Hospice");
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(33000, 33200, 50).unwrap();
    let scan = RangeScanner::new(&ctx, StrategyKind::RangeProbe)
        .scan(&range)
        .await;

    assert_eq!(scan.stats.fetch_errors, 1);
    assert_eq!(scan.stats.probed, 3);
    assert_eq!(scan.records.len(), 1);
    assert!(!ctx.processed().contains(PolicyId::new(33050).unwrap()));
    assert!(ctx.processed().contains(PolicyId::new(33100).unwrap()));
}

#[tokio::test]
async fn test_dense_range_is_refined_without_refetching() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(1000, "Coarse hit");
    fetcher.valid_policy(1010, "Level one hit");
    fetcher.valid_policy(1012, "Level two hit");
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(1000, 1100, 50).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(2), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    let strides: Vec<u64> = outcome.levels.iter().map(|l| l.range.stride()).collect();
    assert_eq!(strides, vec![50, 10, 2]);
    let depths: Vec<u32> = outcome.levels.iter().map(|l| l.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);

    let ids: Vec<u64> = outcome.records.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![1000, 1010, 1012]);

    let calls = fetcher.calls();
    let unique: HashSet<&String> = calls.iter().collect();
    assert_eq!(unique.len(), calls.len(), "an identifier was fetched twice");
    // 2 coarse + 8 new at stride 10 + 40 new at stride 2
    assert_eq!(calls.len(), 50);
    assert_eq!(outcome.stats().probed, 50);
}

#[tokio::test]
async fn test_sparse_range_is_not_refined() {
    let fetcher = Arc::new(MockFetcher::new());
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(25000, 30000, 200).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(2), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    assert_eq!(outcome.levels.len(), 1);
    assert!(outcome.records.is_empty());
    assert_eq!(fetcher.call_count(), 25);
}

#[tokio::test]
async fn test_depth_ceiling_bounds_refinement() {
    let fetcher = Arc::new(MockFetcher::new());
    for id in (2000..2100).step_by(10) {
        fetcher.valid_policy(id, "Dense block");
    }
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(2000, 2100, 10).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(0), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    assert_eq!(outcome.levels.len(), 1);
    assert_eq!(outcome.records.len(), 10);
}

#[tokio::test]
async fn test_stride_one_stops_refinement() {
    let fetcher = Arc::new(MockFetcher::new());
    for id in 3000..3005 {
        fetcher.valid_policy(id, "Contiguous");
    }
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(3000, 3005, 1).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(5), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    assert_eq!(outcome.levels.len(), 1);
    assert_eq!(outcome.records.len(), 5);
}

#[tokio::test]
async fn test_pass_with_only_fetch_errors_is_not_refined() {
    let fetcher = Arc::new(MockFetcher::new());
    for id in (4000..4100).step_by(50) {
        fetcher.fail_policy(id);
    }
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(4000, 4100, 50).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(2), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    assert_eq!(outcome.levels.len(), 1);
    assert_eq!(outcome.stats().fetch_errors, 2);
    assert_eq!(outcome.stats().hit_rate(), None);
}

#[tokio::test]
async fn test_empty_range_probes_nothing() {
    let fetcher = Arc::new(MockFetcher::new());
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(5000, 5000, 10).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(2), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    assert_eq!(outcome.levels.len(), 1);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_stride_covering_span_returns_coarse_pass() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.valid_policy(1000, "Single candidate");
    let ctx = context(fetcher.clone());

    let range = SearchRange::new(1000, 1040, 50).unwrap();
    let outcome = DensityRefiner::new(&ctx, refine_config(2), StrategyKind::RangeProbe)
        .refine(range)
        .await;

    assert_eq!(outcome.levels.len(), 1);
    assert_eq!(outcome.levels[0].range, range);
    let ids: Vec<u64> = outcome.records.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![1000]);
    assert_eq!(fetcher.calls(), vec![record_url(1000)]);
}
