//! 예측 결과 및 캐시 레코드.
//!
//! `Prediction`과 `CacheRecord`는 호출마다 한 번 생성되고 저장소에 한 번 기록되며
//! 이후 변경되지 않습니다. 만료 시각은 저장소의 TTL로만 사용됩니다.

use crate::domain::pattern::{Direction, PatternDetection};
use crate::types::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 감성 신호.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSignal {
    /// 감성 점수 (소스의 대역 범위 내)
    pub score: f64,
    /// 고정 임계값으로 파생된 레이블
    pub label: Direction,
    /// 신호 출처
    pub source: String,
}

impl SentimentSignal {
    /// 점수와 대칭 임계값으로 감성 신호를 생성합니다.
    pub fn new(score: f64, label_threshold: f64, source: impl Into<String>) -> Self {
        Self {
            score,
            label: Direction::classify(score, label_threshold, -label_threshold),
            source: source.into(),
        }
    }

    /// 중립 감성 (점수 0).
    pub fn neutral(source: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            label: Direction::Neutral,
            source: source.into(),
        }
    }
}

/// 방향성 예측.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 고유 예측 ID
    pub id: Uuid,
    /// 거래 심볼
    pub symbol: Symbol,
    /// 결합 점수 (-1.0 ~ 1.0)
    pub score: f64,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 예측 방향
    pub direction: Direction,
    /// 패턴 감지 결과
    pub detections: Vec<PatternDetection>,
    /// 감성 신호
    pub sentiment: SentimentSignal,
    /// 추세 신호의 가격 변동률 (0.05 = 5%)
    pub price_change: f64,
    /// 감지에 사용된 모델 버전
    pub model_version: String,
    /// 결합 정책 식별자 (name@version)
    pub policy: String,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl Prediction {
    /// 만료까지 남은 초. 이미 만료되었으면 0.
    pub fn ttl_secs(&self, now: DateTime<Utc>) -> u64 {
        ttl_secs_until(self.expires_at, now)
    }

    /// 만료 여부.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 호출 단위 결과 캐시 레코드.
///
/// 저장소 키는 `(symbol, timestamp)`입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 생성 시각 (epoch 초)
    pub timestamp: i64,
    /// 저장된 차트 이미지 위치
    pub chart_reference: String,
    /// 패턴 감지 결과
    pub detections: Vec<PatternDetection>,
    /// 예측
    pub prediction: Prediction,
    /// 처리 시간 (밀리초)
    pub processing_duration_ms: u64,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl CacheRecord {
    /// 만료까지 남은 초. 이미 만료되었으면 0.
    pub fn ttl_secs(&self, now: DateTime<Utc>) -> u64 {
        ttl_secs_until(self.expires_at, now)
    }
}

fn ttl_secs_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (expires_at - now).num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_prediction(now: DateTime<Utc>) -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            symbol: Symbol::parse("ETHUSDT").unwrap(),
            score: 0.4,
            confidence: 0.4,
            direction: Direction::Bullish,
            detections: vec![PatternDetection::no_pattern()],
            sentiment: SentimentSignal::neutral("fixed"),
            price_change: 0.01,
            model_version: "placeholder".to_string(),
            policy: "vision@1".to_string(),
            created_at: now,
            expires_at: now + Duration::days(30),
        }
    }

    #[test]
    fn test_sentiment_label() {
        assert_eq!(SentimentSignal::new(0.15, 0.1, "x").label, Direction::Bullish);
        assert_eq!(SentimentSignal::new(-0.15, 0.1, "x").label, Direction::Bearish);
        assert_eq!(SentimentSignal::new(0.1, 0.1, "x").label, Direction::Neutral);
        assert_eq!(SentimentSignal::new(0.15, 0.2, "x").label, Direction::Neutral);
    }

    #[test]
    fn test_prediction_ttl() {
        let now = Utc::now();
        let p = sample_prediction(now);
        assert_eq!(p.ttl_secs(now), 30 * 24 * 3600);
        assert!(!p.is_expired(now));
        assert_eq!(p.ttl_secs(now + Duration::days(31)), 0);
        assert!(p.is_expired(now + Duration::days(31)));
    }

    #[test]
    fn test_prediction_json_shape() {
        let p = sample_prediction(Utc::now());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["symbol"], "ETHUSDT");
        assert_eq!(json["direction"], "bullish");
        assert_eq!(json["detections"][0]["type"], "no_pattern");

        let back: Prediction = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
