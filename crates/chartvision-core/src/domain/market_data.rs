//! 시장 데이터 타입.

use crate::types::{Price, Symbol, Volume};
use serde::{Deserialize, Serialize};

/// OHLCV 가격 바.
///
/// 심볼 내에서 `timestamp` 오름차순으로 정렬되어 전달됩니다.
/// `low ≤ min(open, close) ≤ max(open, close) ≤ high` 불변식은 수집 계층의 책임이며
/// 분석 코어는 위반된 바도 그대로 통과시킵니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 바 시작 시각 (epoch 초)
    pub timestamp: i64,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

impl PriceBar {
    /// 새 가격 바를 생성합니다.
    pub fn new(
        symbol: Symbol,
        timestamp: i64,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
    ) -> Self {
        Self {
            symbol,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// 바 목록이 타임스탬프 오름차순인지 확인합니다.
pub fn is_ascending(bars: &[PriceBar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}
