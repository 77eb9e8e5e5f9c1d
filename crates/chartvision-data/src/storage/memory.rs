//! 인메모리 저장소 구현.
//!
//! 단일 프로세스 실행과 테스트에 사용합니다. 쓰기 실패 주입을 지원하여
//! 저장소 장애 시의 파이프라인 동작을 검증할 수 있습니다.

use crate::error::{DataError, Result};
use crate::store::{ChartStore, MarketDataSource, ResultStore};
use async_trait::async_trait;
use chartvision_core::{CacheRecord, Prediction, PriceBar, Symbol};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

// =============================================================================
// 시장 데이터
// =============================================================================

/// 심볼별 바 목록을 보관하는 시장 데이터 소스.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    bars: RwLock<HashMap<Symbol, Vec<PriceBar>>>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 바를 추가합니다. 삽입 후 타임스탬프 순으로 정렬됩니다.
    pub async fn insert_bars(&self, bars: impl IntoIterator<Item = PriceBar>) {
        let mut map = self.bars.write().await;
        for bar in bars {
            map.entry(bar.symbol.clone()).or_default().push(bar);
        }
        for series in map.values_mut() {
            series.sort_by_key(|b| b.timestamp);
        }
    }
}

#[async_trait]
impl MarketDataSource for InMemoryMarketData {
    async fn recent_bars(&self, symbol: &Symbol, limit: usize) -> Result<Vec<PriceBar>> {
        let map = self.bars.read().await;
        let bars = map.get(symbol).map(Vec::as_slice).unwrap_or_default();
        let start = bars.len().saturating_sub(limit);
        Ok(bars[start..].to_vec())
    }
}

// =============================================================================
// 결과 저장소
// =============================================================================

#[derive(Debug, Default)]
struct ResultTables {
    predictions: HashMap<Uuid, Prediction>,
    cache_records: BTreeMap<(Symbol, i64), CacheRecord>,
}

/// 예측과 캐시 레코드를 보관하는 결과 저장소.
///
/// 만료 시각이 지난 항목은 조회 결과에서 제외됩니다.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    tables: RwLock<ResultTables>,
    fail_writes: AtomicBool,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 모든 쓰기가 실패하도록 설정합니다.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 저장된 예측 수 (만료 항목 포함).
    pub async fn prediction_count(&self) -> usize {
        self.tables.read().await.predictions.len()
    }

    /// 저장된 캐시 레코드 수 (만료 항목 포함).
    pub async fn cache_record_count(&self) -> usize {
        self.tables.read().await.cache_records.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DataError::WriteError("result store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn put_prediction(&self, prediction: &Prediction) -> Result<()> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .predictions
            .insert(prediction.id, prediction.clone());
        Ok(())
    }

    async fn put_cache_record(&self, record: &CacheRecord) -> Result<()> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .cache_records
            .insert((record.symbol.clone(), record.timestamp), record.clone());
        Ok(())
    }

    async fn get_cache_record(
        &self,
        symbol: &Symbol,
        timestamp: i64,
    ) -> Result<Option<CacheRecord>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        Ok(tables
            .cache_records
            .get(&(symbol.clone(), timestamp))
            .filter(|r| r.expires_at > now)
            .cloned())
    }

    async fn cache_records_since(&self, symbol: &Symbol, since: i64) -> Result<Vec<CacheRecord>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        let mut records: Vec<CacheRecord> = tables
            .cache_records
            .range((symbol.clone(), since)..=(symbol.clone(), i64::MAX))
            .map(|(_, r)| r)
            .filter(|r| r.expires_at > now)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }

    async fn recent_predictions(&self, symbol: &Symbol, limit: usize) -> Result<Vec<Prediction>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        let mut predictions: Vec<Prediction> = tables
            .predictions
            .values()
            .filter(|p| &p.symbol == symbol && !p.is_expired(now))
            .cloned()
            .collect();
        predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        predictions.truncate(limit);
        Ok(predictions)
    }
}

// =============================================================================
// 차트 저장소
// =============================================================================

/// 차트 PNG를 메모리에 보관하는 blob 저장소.
#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    charts: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl InMemoryChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 모든 쓰기가 실패하도록 설정합니다.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 키로 저장된 PNG를 조회합니다.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.charts.read().await.get(key).cloned()
    }

    /// 저장된 키 목록.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.charts.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ChartStore for InMemoryChartStore {
    async fn put_chart(&self, key: &str, png: &[u8]) -> Result<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DataError::WriteError("chart store unavailable".to_string()));
        }
        self.charts
            .write()
            .await
            .insert(key.to_string(), png.to_vec());
        Ok(format!("memory://{key}"))
    }
}
