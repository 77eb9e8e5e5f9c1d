//! 분석 코어가 의존하는 저장소 trait.
//!
//! 구현체는 프로세스당 한 번 생성되어 `Arc`로 파이프라인에 주입되며,
//! 여러 분석 호출에서 동시에 사용될 수 있어야 합니다.

use crate::error::Result;
use async_trait::async_trait;
use chartvision_core::{CacheRecord, Prediction, PriceBar, Symbol};

/// 시장 데이터 소스.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 심볼의 최근 `limit`개 바를 타임스탬프 오름차순으로 반환합니다.
    ///
    /// 구현체는 내림차순으로 조회한 뒤 오름차순으로 재정렬합니다.
    async fn recent_bars(&self, symbol: &Symbol, limit: usize) -> Result<Vec<PriceBar>>;
}

/// 예측 및 캐시 레코드 저장소 (키-값, TTL 지원).
///
/// 코어는 `expires_at`만 설정하며 실제 삭제는 저장소가 담당합니다.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// 예측을 기록합니다.
    async fn put_prediction(&self, prediction: &Prediction) -> Result<()>;

    /// 캐시 레코드를 `(symbol, timestamp)` 키로 기록합니다.
    async fn put_cache_record(&self, record: &CacheRecord) -> Result<()>;

    /// 단일 캐시 레코드를 조회합니다.
    async fn get_cache_record(&self, symbol: &Symbol, timestamp: i64)
        -> Result<Option<CacheRecord>>;

    /// `since` 이후(포함)의 캐시 레코드를 최신순으로 조회합니다.
    async fn cache_records_since(&self, symbol: &Symbol, since: i64) -> Result<Vec<CacheRecord>>;

    /// 심볼의 최근 예측을 최신순으로 최대 `limit`개 조회합니다.
    async fn recent_predictions(&self, symbol: &Symbol, limit: usize) -> Result<Vec<Prediction>>;
}

/// 차트 이미지 blob 저장소.
#[async_trait]
pub trait ChartStore: Send + Sync {
    /// PNG 바이트를 키 아래에 저장하고 역참조 가능한 위치 문자열을 반환합니다.
    async fn put_chart(&self, key: &str, png: &[u8]) -> Result<String>;
}
