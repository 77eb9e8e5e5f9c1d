//! 신호 결합 엔진.
//!
//! 패턴, 추세, 감성 신호를 이름과 버전이 있는 정책에 따라 하나의 점수로 결합합니다.
//!
//! ```text
//! final = w_p · pattern_score + w_t · trend_term + w_s · sentiment
//! final = clip(final, -1, 1)
//! confidence = min(|final|, 1)
//! direction = bullish if final > τ+ / bearish if final < τ- / else neutral
//! ```

use crate::ml::signals::TrendSignal;
use crate::ml::{MlError, MlResult};
use chartvision_core::{Direction, PatternDetection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 가중치 합 허용 오차.
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// 결합 가중치.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub pattern: f64,
    pub trend: f64,
    pub sentiment: f64,
}

impl FusionWeights {
    pub fn sum(&self) -> f64 {
        self.pattern + self.trend + self.sentiment
    }
}

/// 추세 신호를 결합 항으로 바꾸는 방식.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendInput {
    /// 변동률에 배율을 곱함
    ScaledChange { scale: f64 },
    /// 부호만 사용 (±1)
    Sign,
}

impl TrendInput {
    fn term(&self, trend: &TrendSignal) -> f64 {
        match self {
            TrendInput::ScaledChange { scale } => trend.change * scale,
            TrendInput::Sign => trend.sign,
        }
    }
}

/// 추세 변동률의 기준 바.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendReference {
    /// 파이프라인에 설정된 lookback 만큼 이전 바
    #[default]
    Lookback,
    /// 분석 창의 첫 바
    WindowStart,
}

/// 결합 정책.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionPolicy {
    name: String,
    version: u32,
    weights: FusionWeights,
    trend_input: TrendInput,
    trend_reference: TrendReference,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl FusionPolicy {
    /// 정책을 생성합니다. 가중치 합이 1이 아니거나 임계값이 뒤집혀 있으면 실패합니다.
    pub fn new(
        name: impl Into<String>,
        version: u32,
        weights: FusionWeights,
        trend_input: TrendInput,
        positive_threshold: f64,
        negative_threshold: f64,
    ) -> MlResult<Self> {
        let name = name.into();
        let sum = weights.sum();
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(MlError::InvalidInput(format!(
                "Policy {} weights must sum to 1.0, got {}",
                name, sum
            )));
        }
        if negative_threshold > positive_threshold {
            return Err(MlError::InvalidInput(format!(
                "Policy {} thresholds inverted: {} > {}",
                name, negative_threshold, positive_threshold
            )));
        }

        Ok(Self {
            name,
            version,
            weights,
            trend_input,
            trend_reference: TrendReference::Lookback,
            positive_threshold,
            negative_threshold,
        })
    }

    /// 추세 기준 바 설정.
    pub fn with_trend_reference(mut self, reference: TrendReference) -> Self {
        self.trend_reference = reference;
        self
    }

    /// 비전 모델 정책 (기본값).
    ///
    /// 패턴 0.6 / 추세 0.3 / 감성 0.1, 추세 변동률 ×10, 임계값 ±0.2.
    pub fn vision_v1() -> Self {
        Self {
            name: "vision_v1".to_string(),
            version: 1,
            weights: FusionWeights {
                pattern: 0.6,
                trend: 0.3,
                sentiment: 0.1,
            },
            trend_input: TrendInput::ScaledChange { scale: 10.0 },
            trend_reference: TrendReference::Lookback,
            positive_threshold: 0.2,
            negative_threshold: -0.2,
        }
    }

    /// 휴리스틱 정책.
    ///
    /// 패턴 0.4 / 추세 0.4 / 감성 0.2, 추세 부호 ±1, 임계값 ±0.1.
    /// 추세는 창의 첫 바와 마지막 바를 비교합니다.
    pub fn heuristic_v1() -> Self {
        Self {
            name: "heuristic_v1".to_string(),
            version: 1,
            weights: FusionWeights {
                pattern: 0.4,
                trend: 0.4,
                sentiment: 0.2,
            },
            trend_input: TrendInput::Sign,
            trend_reference: TrendReference::WindowStart,
            positive_threshold: 0.1,
            negative_threshold: -0.1,
        }
    }

    /// 이름으로 내장 정책을 찾습니다.
    pub fn from_name(name: &str) -> MlResult<Self> {
        match name {
            "vision_v1" => Ok(Self::vision_v1()),
            "heuristic_v1" => Ok(Self::heuristic_v1()),
            other => Err(MlError::InvalidInput(format!(
                "Unknown fusion policy: {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn trend_reference(&self) -> TrendReference {
        self.trend_reference
    }

    pub fn thresholds(&self) -> (f64, f64) {
        (self.positive_threshold, self.negative_threshold)
    }

    /// `name@version` 식별자.
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self::vision_v1()
    }
}

/// 결합 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionOutcome {
    /// 클리핑된 최종 점수 (-1.0 ~ 1.0)
    pub score: f64,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    pub direction: Direction,
    /// 집계된 패턴 점수 (-1.0 ~ 1.0)
    pub pattern_score: f64,
}

/// 감지 결과를 신뢰도 가중 평균으로 집계합니다.
///
/// 총 신뢰도가 0이면 0을 반환합니다.
pub fn aggregate_patterns(detections: &[PatternDetection]) -> f64 {
    let (signed, total) = detections
        .iter()
        .filter(|d| d.confidence.is_finite())
        .fold((0.0, 0.0), |(signed, total), d| {
            (signed + d.signed_confidence(), total + d.confidence)
        });

    if total > 0.0 {
        (signed / total).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// 결합 엔진.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    policy: FusionPolicy,
}

impl FusionEngine {
    pub fn new(policy: FusionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FusionPolicy {
        &self.policy
    }

    /// 세 신호를 결합합니다. 신호가 없어도 실패하지 않습니다.
    pub fn fuse(
        &self,
        detections: &[PatternDetection],
        trend: &TrendSignal,
        sentiment_score: f64,
    ) -> FusionOutcome {
        let policy = &self.policy;
        let pattern_score = aggregate_patterns(detections);
        let trend_term = policy.trend_input.term(trend);
        let sentiment_score = if sentiment_score.is_finite() {
            sentiment_score
        } else {
            0.0
        };

        let raw = policy.weights.pattern * pattern_score
            + policy.weights.trend * trend_term
            + policy.weights.sentiment * sentiment_score;
        let score = if raw.is_finite() {
            raw.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let confidence = score.abs().min(1.0);
        let direction =
            Direction::classify(score, policy.positive_threshold, policy.negative_threshold);

        debug!(
            policy = %policy.identifier(),
            pattern_score,
            trend_term,
            sentiment_score,
            score,
            "Signals fused"
        );

        FusionOutcome {
            score,
            confidence,
            direction,
            pattern_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartvision_core::PatternKind;

    fn trend(change: f64) -> TrendSignal {
        TrendSignal {
            sign: if change > 0.0 { 1.0 } else { -1.0 },
            change,
        }
    }

    #[test]
    fn test_builtin_policies_are_valid() {
        for policy in [FusionPolicy::vision_v1(), FusionPolicy::heuristic_v1()] {
            let weights = *policy.weights();
            let rebuilt = FusionPolicy::new(
                policy.name(),
                policy.version(),
                weights,
                policy.trend_input,
                policy.thresholds().0,
                policy.thresholds().1,
            )
            .unwrap();
            assert_eq!(rebuilt, policy);
        }
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = FusionWeights {
            pattern: 0.5,
            trend: 0.5,
            sentiment: 0.5,
        };
        let result = FusionPolicy::new("bad", 1, weights, TrendInput::Sign, 0.1, -0.1);
        assert!(matches!(result, Err(MlError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_policy_name() {
        assert!(FusionPolicy::from_name("vision_v2").is_err());
        assert_eq!(FusionPolicy::from_name("heuristic_v1").unwrap().identifier(), "heuristic_v1@1");
    }

    #[test]
    fn test_aggregate_patterns() {
        let detections = vec![
            PatternDetection::new(PatternKind::BullishFlag, 0.75, vec![]),
            PatternDetection::new(PatternKind::SupportResistance, 0.68, vec![]),
        ];
        let score = aggregate_patterns(&detections);
        assert!((score - 0.75 / 1.43).abs() < 1e-12);

        assert_eq!(aggregate_patterns(&[]), 0.0);
        assert_eq!(aggregate_patterns(&[PatternDetection::no_pattern()]), 0.0);
    }

    #[test]
    fn test_trend_only_rise_is_clipped_bullish() {
        let engine = FusionEngine::default();
        let outcome = engine.fuse(&[PatternDetection::no_pattern()], &trend(0.5), 0.0);
        // 0.3 × (0.5 × 10) = 1.5 → 1.0
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.confidence, 1.0);
        assert_eq!(outcome.direction, Direction::Bullish);
    }

    #[test]
    fn test_model_unavailable_fallback_is_bearish() {
        let engine = FusionEngine::default();
        let outcome = engine.fuse(&[PatternDetection::no_pattern()], &trend(-0.3), -0.1);
        assert!((outcome.score + 0.91).abs() < 1e-12);
        assert_eq!(outcome.direction, Direction::Bearish);
    }

    #[test]
    fn test_no_signal_is_neutral() {
        let engine = FusionEngine::default();
        let outcome = engine.fuse(&[], &TrendSignal::flat(), 0.0);
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.direction, Direction::Neutral);
    }

    #[test]
    fn test_heuristic_uses_trend_sign() {
        let engine = FusionEngine::new(FusionPolicy::heuristic_v1());
        let outcome = engine.fuse(&[], &trend(0.001), 0.0);
        assert!((outcome.score - 0.4).abs() < 1e-12);
        assert_eq!(outcome.direction, Direction::Bullish);
    }

    #[test]
    fn test_policy_trend_references() {
        assert_eq!(FusionPolicy::vision_v1().trend_reference(), TrendReference::Lookback);
        assert_eq!(FusionPolicy::heuristic_v1().trend_reference(), TrendReference::WindowStart);

        let custom = FusionPolicy::new(
            "custom",
            1,
            FusionWeights {
                pattern: 0.5,
                trend: 0.5,
                sentiment: 0.0,
            },
            TrendInput::Sign,
            0.1,
            -0.1,
        )
        .unwrap()
        .with_trend_reference(TrendReference::WindowStart);
        assert_eq!(custom.trend_reference(), TrendReference::WindowStart);
    }
}
