//! 인메모리 결과 저장소 통합 테스트.

use chartvision_core::{
    CacheRecord, Direction, PatternDetection, PatternKind, Prediction, SentimentSignal, Symbol,
};
use chartvision_data::{InMemoryResultStore, ResultStore};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

fn prediction(symbol: &Symbol, created_at: DateTime<Utc>, ttl: Duration) -> Prediction {
    Prediction {
        id: Uuid::new_v4(),
        symbol: symbol.clone(),
        score: 0.5,
        confidence: 0.5,
        direction: Direction::Bullish,
        detections: vec![PatternDetection::new(PatternKind::BullishFlag, 0.75, vec![])],
        sentiment: SentimentSignal::neutral("fixed"),
        price_change: 0.02,
        model_version: "placeholder_v1".to_string(),
        policy: "vision_v1@1".to_string(),
        created_at,
        expires_at: created_at + ttl,
    }
}

fn record(prediction: &Prediction, timestamp: i64, ttl: Duration) -> CacheRecord {
    CacheRecord {
        symbol: prediction.symbol.clone(),
        timestamp,
        chart_reference: format!("memory://charts/{}/{}.png", prediction.symbol, timestamp),
        detections: prediction.detections.clone(),
        prediction: prediction.clone(),
        processing_duration_ms: 12,
        expires_at: prediction.created_at + ttl,
    }
}

#[tokio::test]
async fn test_cache_record_roundtrip_by_key() {
    let store = InMemoryResultStore::new();
    let symbol = Symbol::parse("ETHUSDT").unwrap();
    let now = Utc::now();
    let p = prediction(&symbol, now, Duration::days(30));
    let r = record(&p, now.timestamp(), Duration::days(7));

    store.put_prediction(&p).await.unwrap();
    store.put_cache_record(&r).await.unwrap();

    let fetched = store
        .get_cache_record(&symbol, now.timestamp())
        .await
        .unwrap()
        .expect("record should exist");
    assert_eq!(fetched, r);
    assert!(store
        .get_cache_record(&symbol, now.timestamp() + 1)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_cache_records_since_filters_by_time_and_symbol() {
    let store = InMemoryResultStore::new();
    let eth = Symbol::parse("ETHUSDT").unwrap();
    let btc = Symbol::parse("BTCUSDT").unwrap();
    let now = Utc::now();
    let base = now.timestamp();

    for (symbol, offset) in [(&eth, -7200), (&eth, -60), (&eth, 0), (&btc, 0)] {
        let p = prediction(symbol, now, Duration::days(30));
        store
            .put_cache_record(&record(&p, base + offset, Duration::days(7)))
            .await
            .unwrap();
    }

    let records = store.cache_records_since(&eth, base - 3600).await.unwrap();
    let timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![base, base - 60]);
}

#[tokio::test]
async fn test_expired_entries_are_hidden() {
    let store = InMemoryResultStore::new();
    let symbol = Symbol::parse("SOLUSDT").unwrap();
    let past = Utc::now() - Duration::days(10);

    let stale = prediction(&symbol, past, Duration::days(7));
    store.put_prediction(&stale).await.unwrap();
    store
        .put_cache_record(&record(&stale, past.timestamp(), Duration::days(7)))
        .await
        .unwrap();

    assert_eq!(store.prediction_count().await, 1);
    assert!(store.recent_predictions(&symbol, 10).await.unwrap().is_empty());
    assert!(store
        .get_cache_record(&symbol, past.timestamp())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_recent_predictions_newest_first_with_limit() {
    let store = InMemoryResultStore::new();
    let symbol = Symbol::parse("XRPUSDT").unwrap();
    let now = Utc::now();

    for minutes in [3, 1, 2] {
        let p = prediction(&symbol, now - Duration::minutes(minutes), Duration::days(30));
        store.put_prediction(&p).await.unwrap();
    }

    let recent = store.recent_predictions(&symbol, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].created_at, now - Duration::minutes(1));
    assert_eq!(recent[1].created_at, now - Duration::minutes(2));
}

#[tokio::test]
async fn test_failed_writes_leave_store_untouched() {
    let store = InMemoryResultStore::new();
    let symbol = Symbol::parse("ADAUSDT").unwrap();
    store.set_fail_writes(true);

    let p = prediction(&symbol, Utc::now(), Duration::days(30));
    assert!(store.put_prediction(&p).await.is_err());
    assert_eq!(store.prediction_count().await, 0);
}
