//! 결합 엔진과 추론 어댑터의 수치 속성.

use chartvision_analytics::{
    aggregate_patterns, softmax, ChartEncoder, FusionEngine, FusionPolicy, SeriesNormalizer,
    TrendSignal, RANGE_EPSILON,
};
use chartvision_core::{Direction, PatternDetection, PatternKind, PriceBar, Symbol};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn detection_strategy() -> impl Strategy<Value = PatternDetection> {
    (0usize..PatternKind::class_count(), 0.0f64..=1.0)
        .prop_map(|(index, confidence)| {
            let kind = PatternKind::CLASSES[index];
            PatternDetection::new(kind, confidence, vec![])
        })
}

fn policy_strategy() -> impl Strategy<Value = FusionPolicy> {
    prop_oneof![
        Just(FusionPolicy::vision_v1()),
        Just(FusionPolicy::heuristic_v1()),
    ]
}

proptest! {
    #[test]
    fn pattern_score_is_bounded(detections in prop::collection::vec(detection_strategy(), 0..8)) {
        let score = aggregate_patterns(&detections);
        prop_assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn fused_score_and_confidence_are_bounded(
        detections in prop::collection::vec(detection_strategy(), 0..8),
        change in -10.0f64..10.0,
        sentiment in -1.0f64..=1.0,
        policy in policy_strategy(),
    ) {
        let trend = TrendSignal { sign: if change > 0.0 { 1.0 } else { -1.0 }, change };
        let outcome = FusionEngine::new(policy.clone()).fuse(&detections, &trend, sentiment);

        prop_assert!((-1.0..=1.0).contains(&outcome.score));
        prop_assert!((0.0..=1.0).contains(&outcome.confidence));
        prop_assert_eq!(outcome.confidence, outcome.score.abs().min(1.0));

        let (pos, neg) = policy.thresholds();
        prop_assert_eq!(outcome.direction, Direction::classify(outcome.score, pos, neg));
    }

    #[test]
    fn softmax_sums_to_one(logits in prop::collection::vec(-50.0f32..50.0, 1..16)) {
        let probs = softmax(&logits);
        let sum: f64 = probs.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn normalized_y_stays_in_unit_range(closes in prop::collection::vec(1u32..100_000, 1..60)) {
        let symbol = Symbol::parse("PROP").unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let c = Decimal::from(c);
                PriceBar::new(symbol.clone(), i as i64, c, c, c, c, Decimal::ONE)
            })
            .collect();

        let series = SeriesNormalizer::new().normalize(&bars).unwrap();
        prop_assert!(series.range >= RANGE_EPSILON);
        prop_assert!(series.points.iter().all(|p| (0.0..=1.0).contains(&p.y)));
        prop_assert!(series.points.iter().all(|p| (0.0..1.0).contains(&p.x)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn encoding_is_deterministic(closes in prop::collection::vec(1u32..1_000, 2..40)) {
        let symbol = Symbol::parse("PROP").unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let c = Decimal::from(c);
                PriceBar::new(symbol.clone(), i as i64, c, c, c, c, Decimal::ONE)
            })
            .collect();
        let series = SeriesNormalizer::new().normalize(&bars).unwrap();
        let encoder = ChartEncoder::new();

        let first = encoder.render(&series).unwrap();
        let second = encoder.render(&series).unwrap();
        prop_assert_eq!(
            encoder.to_tensor(&first).unwrap(),
            encoder.to_tensor(&second).unwrap()
        );
    }
}
