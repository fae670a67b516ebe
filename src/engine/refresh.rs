//! Refresh orchestration: load snapshot, materialize, persist, publish
//!
//! A pass that fails or is cancelled before publication leaves the current
//! fact set untouched.

use std::sync::Arc;
use std::time::Instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use crate::domain::events::{DomainEvent, RefreshEvent};
use crate::domain::value_objects::MatchType;
use crate::engine::materializer::{materialize, MaterializeStats};
use crate::engine::published::FactStore;
use crate::store::{FactSink, SnapshotSource};
use crate::{EngineError, Result};

const EVENT_BUFFER: usize = 64;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Point-in-time cutoff: orders dated after it are left out of the pass.
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefreshReport {
    pub version: u64,
    pub refreshed_at: DateTime<Utc>,
    pub rows: usize,
    #[serde(flatten)]
    pub stats: MaterializeStats,
    pub elapsed_ms: u64,
}

impl RefreshReport {
    /// Rows still waiting for a manual mapping.
    pub fn unmapped(&self) -> usize { self.stats.match_counts.get(&MatchType::Unmapped).copied().unwrap_or_default() }
}

pub struct RefreshService {
    source: Arc<dyn SnapshotSource>,
    sink: Option<Arc<dyn FactSink>>,
    store: Arc<FactStore>,
    events: broadcast::Sender<DomainEvent>,
    gate: Mutex<()>,
}

impl RefreshService {
    pub fn new(source: Arc<dyn SnapshotSource>, store: Arc<FactStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { source, sink: None, store, events, gate: Mutex::new(()) }
    }

    pub fn with_sink(mut self, sink: Arc<dyn FactSink>) -> Self { self.sink = Some(sink); self }

    pub fn store(&self) -> &Arc<FactStore> { &self.store }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> { self.events.subscribe() }

    /// Rebuilds and publishes the whole fact set. Concurrent calls run one after another.
    #[tracing::instrument(skip_all, fields(as_of = ?request.as_of))]
    pub async fn refresh(&self, request: RefreshRequest, cancel: &CancellationToken) -> Result<RefreshReport> {
        let _pass = self.gate.lock().await;
        match self.run_pass(request, cancel).await {
            Ok(report) => {
                let unmapped = report.unmapped();
                tracing::info!(version = report.version, rows = report.rows, unmapped, excluded = report.stats.excluded_items,
                    elapsed_ms = report.elapsed_ms, "sales facts refreshed");
                self.emit(RefreshEvent::Published { version: report.version, rows: report.rows, unmapped, refreshed_at: report.refreshed_at });
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "sales fact refresh aborted; previous fact set stays published");
                self.emit(RefreshEvent::Aborted { reason: e.to_string() });
                Err(e)
            }
        }
    }

    async fn run_pass(&self, request: RefreshRequest, cancel: &CancellationToken) -> Result<RefreshReport> {
        let started = Instant::now();
        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            snapshot = self.source.load() => snapshot?,
        };
        tracing::debug!(items = snapshot.order_items.len(), load_ms = millis(started), "snapshot loaded");

        let as_of = request.as_of;
        let materialized = tokio::task::spawn_blocking(move || materialize(snapshot, as_of))
            .await
            .map_err(|e| EngineError::Worker(e.to_string()))?;
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let version = self.store.next_version();
        let refreshed_at = Utc::now();
        if let Some(sink) = &self.sink {
            sink.replace_all(version, refreshed_at, &materialized.facts).await?;
        }
        let rows = materialized.facts.len();
        self.store.publish(version, refreshed_at, materialized.facts);

        Ok(RefreshReport { version, refreshed_at, rows, stats: materialized.stats, elapsed_ms: millis(started) })
    }

    fn emit(&self, event: RefreshEvent) {
        // no subscribers is fine
        let _ = self.events.send(DomainEvent::Refresh(event));
    }
}

fn millis(started: Instant) -> u64 { u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX) }

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use uuid::Uuid;
    use crate::domain::aggregates::{CatalogProduct, MappingRule, Order, OrderLineItem, SalesFact};
    use crate::store::{InMemorySnapshotSource, Snapshot};

    fn snapshot() -> Snapshot {
        let day = Utc.with_ymd_and_hms(2025, 12, 20, 12, 0, 0).unwrap();
        Snapshot {
            products: vec![
                CatalogProduct::new("BAKC_U04010", "Barra Keto Cacao").with_category("BARRAS").with_units_per_display(1)
                    .with_master_box("BAKC_C02810", 140, "Caja Master Barra Keto Cacao"),
                CatalogProduct::new("SKU_A", "Alfajor").with_category("ALFAJORES"),
                CatalogProduct::new("SKU_B", "Galleta").with_category("GALLETAS"),
            ],
            mapping_rules: vec![MappingRule::exact(1, "PACKNAVIDAD", "SKU_A", 1), MappingRule::exact(2, "PACKNAVIDAD", "SKU_B", 7)],
            orders: vec![
                Order::new(Uuid::from_u128(1), day, "relbase"),
                Order::new(Uuid::from_u128(2), day, "relbase").with_status("cancelled"),
            ],
            order_items: vec![
                OrderLineItem::new(1, Uuid::from_u128(1), "BAKC_U04010", 10),
                OrderLineItem::new(2, Uuid::from_u128(1), "BAKC_C02810", 2),
                OrderLineItem::new(3, Uuid::from_u128(1), "PACKNAVIDAD", 1),
                OrderLineItem::new(4, Uuid::from_u128(1), "???", 3),
                OrderLineItem::new(5, Uuid::from_u128(2), "BAKC_U04010", 99),
            ],
            ..Default::default()
        }
    }

    fn service(source: Arc<dyn SnapshotSource>) -> RefreshService { RefreshService::new(source, Arc::new(FactStore::new())) }

    struct Unavailable;
    #[async_trait]
    impl SnapshotSource for Unavailable {
        async fn load(&self) -> Result<Snapshot> { Err(EngineError::Snapshot(sqlx::Error::PoolTimedOut)) }
    }

    #[derive(Default)]
    struct RecordingSink { writes: std::sync::Mutex<Vec<(u64, usize)>> }
    #[async_trait]
    impl FactSink for RecordingSink {
        async fn replace_all(&self, version: u64, _at: DateTime<Utc>, facts: &[SalesFact]) -> Result<()> {
            self.writes.lock().unwrap().push((version, facts.len()));
            Ok(())
        }
    }

    struct BrokenSink;
    #[async_trait]
    impl FactSink for BrokenSink {
        async fn replace_all(&self, _: u64, _: DateTime<Utc>, _: &[SalesFact]) -> Result<()> { Err(EngineError::Persist(sqlx::Error::PoolClosed)) }
    }

    #[tokio::test]
    async fn test_refresh_publishes_resolved_facts() {
        let svc = service(Arc::new(InMemorySnapshotSource::new(snapshot())));
        let report = svc.refresh(RefreshRequest::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!((report.version, report.rows, report.stats.excluded_items), (1, 4, 1));
        let set = svc.store().current();
        assert_eq!(set.get(1).unwrap().units_sold, 10);
        let master = set.get(2).unwrap();
        assert_eq!((master.units_sold, master.category.as_deref(), master.match_type), (280, Some("BARRAS"), MatchType::CajaMaster));
        assert_eq!(set.get(3).unwrap().units_sold, 8);
        assert_eq!(set.get(4).unwrap().match_type, MatchType::Unmapped);
        assert!(set.get(5).is_none());
    }

    #[tokio::test]
    async fn test_refresh_twice_is_idempotent() {
        let svc = service(Arc::new(InMemorySnapshotSource::new(snapshot())));
        let cancel = CancellationToken::new();
        svc.refresh(RefreshRequest::default(), &cancel).await.unwrap();
        let first = svc.store().current();
        svc.refresh(RefreshRequest::default(), &cancel).await.unwrap();
        let second = svc.store().current();
        assert_eq!(second.version(), 2);
        assert_eq!(serde_json::to_vec(first.facts()).unwrap(), serde_json::to_vec(second.facts()).unwrap());
    }

    #[tokio::test]
    async fn test_full_replace_drops_rows_of_cancelled_orders() {
        let source = Arc::new(InMemorySnapshotSource::new(snapshot()));
        let svc = service(source.clone());
        let cancel = CancellationToken::new();
        svc.refresh(RefreshRequest::default(), &cancel).await.unwrap();
        source.update(|s| s.orders[0].status = Some("cancelled".into()));
        svc.refresh(RefreshRequest::default(), &cancel).await.unwrap();
        assert!(svc.store().current().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_refresh_keeps_previous_set() {
        let svc = service(Arc::new(InMemorySnapshotSource::new(snapshot())));
        svc.refresh(RefreshRequest::default(), &CancellationToken::new()).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = svc.refresh(RefreshRequest::default(), &cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert_eq!(svc.store().current().version(), 1);
        assert_eq!(svc.store().current().len(), 4);
    }

    #[tokio::test]
    async fn test_source_failure_keeps_previous_set_and_emits_abort() {
        let svc = service(Arc::new(Unavailable));
        let mut events = svc.subscribe();
        assert!(svc.refresh(RefreshRequest::default(), &CancellationToken::new()).await.is_err());
        assert_eq!(svc.store().current().version(), 0);
        assert!(matches!(events.recv().await.unwrap(), DomainEvent::Refresh(RefreshEvent::Aborted { .. })));
    }

    #[tokio::test]
    async fn test_sink_receives_each_generation() {
        let sink = Arc::new(RecordingSink::default());
        let svc = service(Arc::new(InMemorySnapshotSource::new(snapshot()))).with_sink(sink.clone());
        let mut events = svc.subscribe();
        svc.refresh(RefreshRequest::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(*sink.writes.lock().unwrap(), vec![(1, 4)]);
        match events.recv().await.unwrap() {
            DomainEvent::Refresh(RefreshEvent::Published { version, rows, unmapped, .. }) => assert_eq!((version, rows, unmapped), (1, 4, 1)),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_publish() {
        let svc = service(Arc::new(InMemorySnapshotSource::new(snapshot()))).with_sink(Arc::new(BrokenSink));
        assert!(matches!(svc.refresh(RefreshRequest::default(), &CancellationToken::new()).await, Err(EngineError::Persist(_))));
        assert_eq!(svc.store().current().version(), 0);
    }

    #[tokio::test]
    async fn test_as_of_limits_the_pass() {
        let svc = service(Arc::new(InMemorySnapshotSource::new(snapshot())));
        let request = RefreshRequest { as_of: Some(Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap()) };
        let report = svc.refresh(request, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.rows, 0);
    }
}
