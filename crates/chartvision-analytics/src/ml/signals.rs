//! 추세 및 감성 신호 추출.

use chartvision_core::{SentimentSignal, Symbol};
use rand::Rng;
use serde::{Deserialize, Serialize};

// =============================================================================
// 추세 신호
// =============================================================================

/// 가격 추세 신호.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    /// 최근 종가가 기준가보다 높으면 +1, 아니면 -1. 데이터가 없으면 0.
    pub sign: f64,
    /// 변동률 (0.05 = 5%). 기준가가 0이면 0.
    pub change: f64,
}

impl TrendSignal {
    /// 데이터가 없을 때의 중립 추세.
    pub fn flat() -> Self {
        Self {
            sign: 0.0,
            change: 0.0,
        }
    }
}

/// 추세 추출기.
///
/// 최근 종가를 `lookback`번째 이전 종가와 비교합니다.
/// 바가 `lookback`개보다 적으면 가장 오래된 종가를 기준으로 씁니다.
#[derive(Debug, Clone, Copy)]
pub struct TrendExtractor {
    lookback: usize,
}

impl Default for TrendExtractor {
    fn default() -> Self {
        Self { lookback: 20 }
    }
}

impl TrendExtractor {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn extract(&self, closes: &[f64]) -> TrendSignal {
        let start = closes.len().saturating_sub(self.lookback);
        Self::against(closes, start)
    }

    /// 창의 첫 바를 기준으로 추세를 계산합니다.
    pub fn extract_from_start(closes: &[f64]) -> TrendSignal {
        Self::against(closes, 0)
    }

    fn against(closes: &[f64], reference_index: usize) -> TrendSignal {
        let (Some(&recent), Some(&reference)) = (closes.last(), closes.get(reference_index))
        else {
            return TrendSignal::flat();
        };

        let change = if reference == 0.0 {
            0.0
        } else {
            (recent - reference) / reference
        };

        TrendSignal {
            sign: if recent > reference { 1.0 } else { -1.0 },
            change: if change.is_finite() { change } else { 0.0 },
        }
    }
}

// =============================================================================
// 감성 신호
// =============================================================================

/// 감성 신호 소스.
///
/// 외부 피드든 대체 생성기든 결합 엔진은 이 인터페이스만 봅니다.
pub trait SentimentSource: Send + Sync {
    fn sentiment(&self, symbol: &Symbol) -> SentimentSignal;
}

/// 감성 점수 범위와 레이블 임계값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBand {
    /// 점수 범위 `[-bound, bound]`
    pub bound: f64,
    /// 레이블 임계값 (±)
    pub label_threshold: f64,
    /// 신호 출처 이름
    pub source: String,
}

impl SentimentBand {
    /// `[-1, 1]`, 레이블 임계값 ±0.2.
    pub fn wide() -> Self {
        Self {
            bound: 1.0,
            label_threshold: 0.2,
            source: "placeholder".to_string(),
        }
    }

    /// `[-0.3, 0.3]`, 레이블 임계값 ±0.1.
    pub fn conservative() -> Self {
        Self {
            bound: 0.3,
            label_threshold: 0.1,
            source: "price_action".to_string(),
        }
    }

    /// 이름으로 대역을 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wide" => Some(Self::wide()),
            "conservative" => Some(Self::conservative()),
            _ => None,
        }
    }

    /// 점수를 대역 안으로 자릅니다.
    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(-self.bound, self.bound)
    }
}

impl Default for SentimentBand {
    fn default() -> Self {
        Self::conservative()
    }
}

/// 대역 내 균등 분포 난수 감성 (비결정적).
#[derive(Debug, Clone, Default)]
pub struct RandomSentiment {
    band: SentimentBand,
}

impl RandomSentiment {
    pub fn new(band: SentimentBand) -> Self {
        Self { band }
    }

    pub fn band(&self) -> &SentimentBand {
        &self.band
    }
}

impl SentimentSource for RandomSentiment {
    fn sentiment(&self, _symbol: &Symbol) -> SentimentSignal {
        let bound = self.band.bound;
        let score = if bound > 0.0 {
            rand::thread_rng().gen_range(-bound..=bound)
        } else {
            0.0
        };
        SentimentSignal::new(score, self.band.label_threshold, self.band.source.clone())
    }
}

/// 고정 점수 감성.
#[derive(Debug, Clone)]
pub struct FixedSentiment {
    score: f64,
    band: SentimentBand,
}

impl FixedSentiment {
    /// 대역 안으로 잘린 고정 점수.
    pub fn new(score: f64, band: SentimentBand) -> Self {
        Self {
            score: band.clamp(score),
            band,
        }
    }

    /// 점수 0.
    pub fn neutral() -> Self {
        Self::new(0.0, SentimentBand::conservative())
    }
}

impl SentimentSource for FixedSentiment {
    fn sentiment(&self, _symbol: &Symbol) -> SentimentSignal {
        SentimentSignal::new(self.score, self.band.label_threshold, "fixed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartvision_core::Direction;

    #[test]
    fn test_trend_uses_lookback_reference() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let trend = TrendExtractor::new(20).extract(&closes);
        // 기준: closes[10] = 110, 최근: 129
        assert_eq!(trend.sign, 1.0);
        assert!((trend.change - 19.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_trend_falls_back_to_earliest_bar() {
        let trend = TrendExtractor::new(20).extract(&[100.0, 90.0, 80.0]);
        assert_eq!(trend.sign, -1.0);
        assert!((trend.change + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_trend_from_window_start_ignores_lookback() {
        // 100 → 200 상승 후 마지막 20개 바에서 150으로 하락
        let mut closes: Vec<f64> = (0..=20).map(|i| 100.0 + 5.0 * i as f64).collect();
        closes.extend((1..=20).map(|i| 200.0 - 2.5 * i as f64));

        assert_eq!(TrendExtractor::new(20).extract(&closes).sign, -1.0);

        let trend = TrendExtractor::extract_from_start(&closes);
        assert_eq!(trend.sign, 1.0);
        assert!((trend.change - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trend_zero_reference_is_guarded() {
        let trend = TrendExtractor::new(20).extract(&[0.0, 5.0]);
        assert_eq!(trend.change, 0.0);
        assert_eq!(trend.sign, 1.0);
    }

    #[test]
    fn test_trend_empty_is_flat() {
        assert_eq!(TrendExtractor::default().extract(&[]), TrendSignal::flat());
    }

    #[test]
    fn test_random_sentiment_stays_in_band() {
        let source = RandomSentiment::new(SentimentBand::conservative());
        let symbol = Symbol::parse("BTCUSDT").unwrap();
        for _ in 0..200 {
            let signal = source.sentiment(&symbol);
            assert!(signal.score >= -0.3 && signal.score <= 0.3);
            let expected = Direction::classify(signal.score, 0.1, -0.1);
            assert_eq!(signal.label, expected);
            assert_eq!(signal.source, "price_action");
        }
    }

    #[test]
    fn test_fixed_sentiment_is_clamped_and_labeled() {
        let symbol = Symbol::parse("BTCUSDT").unwrap();
        let signal = FixedSentiment::new(-0.9, SentimentBand::conservative()).sentiment(&symbol);
        assert_eq!(signal.score, -0.3);
        assert_eq!(signal.label, Direction::Bearish);

        let signal = FixedSentiment::neutral().sentiment(&symbol);
        assert_eq!(signal.label, Direction::Neutral);
    }

    #[test]
    fn test_band_from_name() {
        assert_eq!(SentimentBand::from_name("wide"), Some(SentimentBand::wide()));
        assert!(SentimentBand::from_name("loud").is_none());
    }
}
