//! 批处理执行器与驱动循环集成测试（内存存储）

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use theme_mapper::{
    BatchDriver, BatchPhase, BatchRequest, BatchRunner, BatchStatus, InMemoryProductStore,
    MappingMode, ProductFilter, ProductRow, ProductStore, StoredProduct, Theme, ThemeAssignment,
    ThemeClassifier, ThemeMapperError, ThemeSet, TmResult,
};

fn unclassified_store(ids: &[i64]) -> Arc<InMemoryProductStore> {
    Arc::new(InMemoryProductStore::new(ids.iter().map(|&id| {
        StoredProduct::new(id, &format!("Printed Kurta {}", id), Some("Apparel"), Some("Topwear"))
    })))
}

fn runner_for(store: Arc<InMemoryProductStore>) -> BatchRunner<InMemoryProductStore> {
    BatchRunner::new(store, ThemeClassifier::builtin().unwrap())
}

#[tokio::test]
async fn test_cursor_pagination_over_three_batches() {
    let store = unclassified_store(&[10, 11, 12, 13, 14]);
    let runner = runner_for(Arc::clone(&store));

    let first = BatchRequest::new(MappingMode::UnmappedOnly).with_batch_size(2);
    let progress = runner.run_batch(&first).await;
    assert_eq!(progress.status, BatchStatus::Processing);
    assert_eq!(progress.processed_count, 2);
    assert_eq!(progress.total_count, 5);
    assert_eq!(progress.last_processed_id, Some(11));
    assert!(progress.has_more);
    assert!(store.get(11).await.unwrap().assigned_themes.is_some());
    assert!(store.get(12).await.unwrap().assigned_themes.is_none());

    let second = first.next(&progress);
    let progress = runner.run_batch(&second).await;
    assert_eq!(progress.processed_count, 2);
    assert_eq!(progress.last_processed_id, Some(13));
    assert!(progress.has_more);
    assert_eq!(progress.current_batch, 2);

    let third = second.next(&progress);
    assert_eq!(third.last_processed_id, Some(13));
    let progress = runner.run_batch(&third).await;
    assert_eq!(progress.processed_count, 1);
    assert_eq!(progress.last_processed_id, Some(14));
    assert!(!progress.has_more);
    assert_eq!(progress.status, BatchStatus::Complete);
    assert_eq!(progress.current_batch, 3);
    assert_eq!(progress.total_batches, 3);

    for product in store.snapshot().await {
        let themes = product.assigned_themes.expect("every row classified");
        assert!(themes.contains(Theme::FestiveEthnic));
    }
}

#[tokio::test]
async fn test_rerun_after_completion_is_noop() {
    let store = unclassified_store(&[1, 2, 3]);
    let runner = runner_for(Arc::clone(&store));

    let summary = BatchDriver::new()
        .run_to_completion(&runner, BatchRequest::new(MappingMode::UnmappedOnly).with_batch_size(2))
        .await
        .unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.batches, 2);
    assert!(summary.is_complete());

    let progress = runner
        .run_batch(&BatchRequest::new(MappingMode::UnmappedOnly).with_batch_size(2))
        .await;
    assert_eq!(progress.status, BatchStatus::Complete);
    assert_eq!(progress.processed_count, 0);
    assert_eq!(progress.total_count, 0);
    assert!(!progress.has_more);
}

#[tokio::test]
async fn test_unmapped_mode_skips_classified_rows() {
    let mut mapped = StoredProduct::new(2, "Party Sequin Top", Some("Apparel"), Some("Topwear"));
    let sentinel: ThemeSet = [Theme::HomeLiving].into_iter().collect();
    mapped.assigned_themes = Some(sentinel.clone());
    let store = Arc::new(InMemoryProductStore::new(vec![
        StoredProduct::new(1, "Linen Shorts", Some("Apparel"), Some("Bottomwear")),
        mapped,
        StoredProduct::new(3, "Wool Cardigan", Some("Apparel"), Some("Topwear")),
    ]));
    let runner = runner_for(Arc::clone(&store));

    let summary = BatchDriver::new()
        .run_to_completion(&runner, BatchRequest::new(MappingMode::UnmappedOnly))
        .await
        .unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(store.get(2).await.unwrap().assigned_themes, Some(sentinel));
    assert!(
        store.get(1).await.unwrap().assigned_themes.unwrap().contains(Theme::SummerVibes)
    );
    assert!(
        store.get(3).await.unwrap().assigned_themes.unwrap().contains(Theme::WinterLayers)
    );
}

#[tokio::test]
async fn test_all_mode_overwrites_deterministically() {
    let mut stale = StoredProduct::new(1, "Anything", None, Some("Saree"));
    stale.assigned_themes = Some([Theme::Fragrance].into_iter().collect());
    let store = Arc::new(InMemoryProductStore::new(vec![
        stale,
        StoredProduct::new(2, "Gizmo", Some("Gadgets"), None),
    ]));
    let runner = runner_for(Arc::clone(&store));
    let driver = BatchDriver::new();

    driver
        .run_to_completion(&runner, BatchRequest::new(MappingMode::All).with_batch_size(1))
        .await
        .unwrap();
    let first_pass = store.snapshot().await;
    let expected: ThemeSet = [Theme::FestiveEthnic, Theme::PartyGlam].into_iter().collect();
    assert_eq!(first_pass[0].assigned_themes, Some(expected));
    assert_eq!(
        first_pass[1].assigned_themes,
        Some([Theme::CasualEveryday].into_iter().collect())
    );

    let summary = driver
        .run_to_completion(&runner, BatchRequest::new(MappingMode::All).with_batch_size(1))
        .await
        .unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(store.snapshot().await, first_pass);
}

#[tokio::test]
async fn test_all_mode_terminates_on_empty_page() {
    let store = unclassified_store(&[1, 2, 3]);
    let runner = runner_for(store);

    let request = BatchRequest::new(MappingMode::All)
        .with_batch_size(5)
        .with_cursor(Some(3));
    let progress = runner.run_batch(&request).await;
    assert_eq!(progress.status, BatchStatus::Complete);
    assert_eq!(progress.total_count, 3);
    assert_eq!(progress.processed_count, 0);
    assert_eq!(progress.last_processed_id, Some(3));
}

/// 第 fail_on 次批量回写时失败的存储
struct FlakyStore {
    inner: InMemoryProductStore,
    updates: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl ProductStore for FlakyStore {
    async fn count(&self, filter: ProductFilter) -> TmResult<u64> {
        self.inner.count(filter).await
    }

    async fn fetch_page(
        &self,
        filter: ProductFilter,
        after_id: Option<i64>,
        limit: usize,
    ) -> TmResult<Vec<ProductRow>> {
        self.inner.fetch_page(filter, after_id, limit).await
    }

    async fn bulk_update(&self, assignments: &[ThemeAssignment]) -> TmResult<usize> {
        let call = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(ThemeMapperError::StoreUpdateError("connection reset".to_string()));
        }
        self.inner.bulk_update(assignments).await
    }
}

#[tokio::test]
async fn test_store_failure_stops_driver_with_resumable_cursor() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryProductStore::new((1..=6).map(|id| StoredProduct::new(id, "Tee", None, None))),
        updates: AtomicUsize::new(0),
        fail_on: 2,
    });
    let runner = BatchRunner::new(Arc::clone(&store), ThemeClassifier::builtin().unwrap());

    let err = BatchDriver::new()
        .run_to_completion(&runner, BatchRequest::new(MappingMode::UnmappedOnly).with_batch_size(2))
        .await
        .unwrap_err();
    assert_eq!(err.failed_batch, 2);
    assert_eq!(err.summary.batches, 1);
    assert_eq!(err.summary.last_processed_id, Some(2));
    assert!(err.message.contains("connection reset"));

    let failed = err.summary.final_progress.clone().unwrap();
    assert_eq!(failed.status, BatchStatus::Error);
    assert_eq!(failed.phase, BatchPhase::Updating);
    assert_eq!(failed.last_processed_id, Some(2));

    // 失败批次未写入，使用同一游标重试会处理相同区间
    assert!(store.inner.get(3).await.unwrap().assigned_themes.is_none());
    let resumed = BatchDriver::new()
        .run_to_completion(
            &runner,
            BatchRequest::new(MappingMode::UnmappedOnly)
                .with_batch_size(2)
                .with_cursor(err.summary.last_processed_id),
        )
        .await
        .unwrap();
    assert_eq!(resumed.processed, 4);
    assert!(resumed.is_complete());
}

#[tokio::test]
async fn test_driver_respects_max_batches() {
    let store = unclassified_store(&[1, 2, 3, 4, 5]);
    let runner = runner_for(Arc::clone(&store));

    let summary = BatchDriver::new()
        .with_max_batches(Some(1))
        .run_to_completion(&runner, BatchRequest::new(MappingMode::UnmappedOnly).with_batch_size(2))
        .await
        .unwrap();
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.last_processed_id, Some(2));
    assert!(!summary.is_complete());
    assert_eq!(store.count(ProductFilter::Unmapped).await.unwrap(), 3);
}
