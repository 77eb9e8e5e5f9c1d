//! 패턴 분석 파이프라인.
//!
//! 한 번의 호출은 하나의 심볼에 대해 다음 단계를 순서대로 실행합니다:
//!
//! ```text
//! 시장 데이터 → 정규화 → 차트 인코딩 → 패턴 추론 ─┐
//!                                   추세 신호 ───┼─→ 결합 → Prediction → 저장
//!                                   감성 신호 ───┘
//! ```
//!
//! 저장소 협력자는 생성 시 주입되며 프로세스 수명 동안 재사용됩니다.
//! 호출 간 공유 가변 상태는 없습니다.

use crate::ml::{
    ChartEncoder, EncodedChart, FusionEngine, FusionPolicy, MlError, MlResult, PatternClassifier,
    RandomSentiment, SentimentBand, SentimentSource, SeriesNormalizer, TrendExtractor,
    TrendReference,
};
use chartvision_core::{CacheRecord, PatternDetection, PipelineConfig, Prediction, Symbol};
use chartvision_data::{ChartStore, MarketDataSource, ResultStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// 파이프라인 실행 설정.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 조회할 최근 바 개수
    pub window_size: usize,
    /// 분석에 필요한 최소 바 개수
    pub min_bars: usize,
    /// 예측 보존 기간
    pub prediction_ttl: Duration,
    /// 캐시 레코드 보존 기간
    pub cache_ttl: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            window_size: config.window_size.max(1),
            min_bars: config.min_bars.max(2),
            prediction_ttl: Duration::days(config.prediction_ttl_days),
            cache_ttl: Duration::days(config.cache_ttl_days),
        }
    }
}

/// 상세 분석 결과.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub prediction: Prediction,
    pub cache_record: CacheRecord,
    /// 모델을 사용할 수 없어 no_pattern으로 대체했는지 여부
    pub model_fallback: bool,
}

/// 패턴 분석 파이프라인.
pub struct PatternPipeline {
    market_data: Arc<dyn MarketDataSource>,
    results: Arc<dyn ResultStore>,
    charts: Arc<dyn ChartStore>,
    classifier: PatternClassifier,
    sentiment: Arc<dyn SentimentSource>,
    normalizer: SeriesNormalizer,
    encoder: ChartEncoder,
    trend: TrendExtractor,
    fusion: FusionEngine,
    settings: PipelineSettings,
}

impl PatternPipeline {
    /// 기본 정책(vision_v1)과 보수적 감성 대역으로 파이프라인을 생성합니다.
    pub fn new(
        market_data: Arc<dyn MarketDataSource>,
        results: Arc<dyn ResultStore>,
        charts: Arc<dyn ChartStore>,
        classifier: PatternClassifier,
    ) -> Self {
        let encoder = ChartEncoder::new().with_contract(*classifier.contract());
        Self {
            market_data,
            results,
            charts,
            classifier,
            sentiment: Arc::new(RandomSentiment::new(SentimentBand::conservative())),
            normalizer: SeriesNormalizer::new(),
            encoder,
            trend: TrendExtractor::default(),
            fusion: FusionEngine::default(),
            settings: PipelineSettings::default(),
        }
    }

    /// 설정 파일의 파이프라인 섹션을 적용합니다.
    pub fn with_config(self, config: &PipelineConfig) -> MlResult<Self> {
        let policy = FusionPolicy::from_name(&config.policy)?;
        let band = SentimentBand::from_name(&config.sentiment_band).ok_or_else(|| {
            MlError::InvalidInput(format!("Unknown sentiment band: {}", config.sentiment_band))
        })?;

        Ok(self
            .with_policy(policy)
            .with_sentiment(Arc::new(RandomSentiment::new(band)))
            .with_trend_lookback(config.trend_lookback)
            .with_settings(PipelineSettings::from(config)))
    }

    /// 결합 정책 설정.
    pub fn with_policy(mut self, policy: FusionPolicy) -> Self {
        self.fusion = FusionEngine::new(policy);
        self
    }

    /// 감성 소스 설정.
    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentSource>) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// 추세 비교 기준 바 개수 설정.
    pub fn with_trend_lookback(mut self, lookback: usize) -> Self {
        self.trend = TrendExtractor::new(lookback);
        self
    }

    /// 실행 설정.
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn policy(&self) -> &FusionPolicy {
        self.fusion.policy()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 심볼을 분석하여 예측을 반환합니다.
    ///
    /// 저장에 실패하면 `StorageWriteFailed`에 계산된 예측이 함께 담깁니다.
    pub async fn analyze(&self, symbol: &str) -> MlResult<Prediction> {
        self.analyze_detailed(symbol)
            .await
            .map(|report| report.prediction)
    }

    /// 심볼을 분석하여 예측과 캐시 레코드를 반환합니다.
    pub async fn analyze_detailed(&self, symbol: &str) -> MlResult<AnalysisReport> {
        let symbol = Symbol::parse(symbol)?;
        let span = chartvision_core::analysis_span!(
            "analyze",
            symbol.as_str(),
            self.fusion.policy().identifier()
        );
        self.run(symbol).instrument(span).await
    }

    async fn run(&self, symbol: Symbol) -> MlResult<AnalysisReport> {
        let started = Instant::now();

        // 1. 시장 데이터
        let bars = self
            .market_data
            .recent_bars(&symbol, self.settings.window_size)
            .await
            .map_err(|e| MlError::MarketData(e.to_string()))?;

        // 2. 정규화
        let series = self.normalizer.normalize(&bars)?;
        if series.len() < self.settings.min_bars {
            return Err(MlError::InsufficientData {
                required: self.settings.min_bars,
                actual: series.len(),
            });
        }

        // 3. 인코딩 (아직 저장하지 않음)
        let created_at = Utc::now();
        let EncodedChart {
            tensor,
            png,
            storage_key,
        } = self.encoder.encode(&series, &symbol, created_at)?;

        // 4. 패턴 추론 (블로킹 호출)
        let classifier = self.classifier.clone();
        let classified = tokio::task::spawn_blocking(move || classifier.classify(&tensor))
            .await
            .map_err(|e| MlError::ModelUnavailable(format!("Inference task failed: {}", e)))
            .and_then(|result| result);

        let (detections, model_fallback) = match classified {
            Ok(detections) if !detections.is_empty() => (detections, false),
            Ok(_) => (vec![PatternDetection::no_pattern()], false),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Pattern model unavailable, using no_pattern");
                (vec![PatternDetection::no_pattern()], true)
            }
            Err(e) => return Err(e),
        };

        // 5. 추세 / 감성
        let closes = series.closes();
        let trend = match self.fusion.policy().trend_reference() {
            TrendReference::Lookback => self.trend.extract(&closes),
            TrendReference::WindowStart => TrendExtractor::extract_from_start(&closes),
        };
        let sentiment = self.sentiment.sentiment(&symbol);

        // 6. 결합
        let outcome = self.fusion.fuse(&detections, &trend, sentiment.score);

        let prediction = Prediction {
            id: Uuid::new_v4(),
            symbol: symbol.clone(),
            score: outcome.score,
            confidence: outcome.confidence,
            direction: outcome.direction,
            detections: detections.clone(),
            sentiment,
            price_change: trend.change,
            model_version: self.classifier.model_version().to_string(),
            policy: self.fusion.policy().identifier(),
            created_at,
            expires_at: created_at + self.settings.prediction_ttl,
        };

        info!(
            bars = bars.len(),
            top_pattern = detections[0].kind.as_str(),
            score = prediction.score,
            direction = %prediction.direction,
            "Prediction computed"
        );

        // 7. 저장
        let chart_reference = match self.charts.put_chart(&storage_key, &png).await {
            Ok(location) => location,
            Err(e) => return Err(storage_failure("chart", e, prediction)),
        };

        if let Err(e) = self.results.put_prediction(&prediction).await {
            return Err(storage_failure("prediction", e, prediction));
        }

        let cache_record = CacheRecord {
            symbol,
            timestamp: created_at.timestamp(),
            chart_reference,
            detections,
            prediction: prediction.clone(),
            processing_duration_ms: started.elapsed().as_millis() as u64,
            expires_at: created_at + self.settings.cache_ttl,
        };

        if let Err(e) = self.results.put_cache_record(&cache_record).await {
            return Err(storage_failure("cache record", e, prediction));
        }

        info!(
            duration_ms = cache_record.processing_duration_ms,
            chart = %cache_record.chart_reference,
            "Analysis stored"
        );

        Ok(AnalysisReport {
            prediction,
            cache_record,
            model_fallback,
        })
    }
}

fn storage_failure(
    what: &str,
    err: chartvision_data::DataError,
    prediction: Prediction,
) -> MlError {
    warn!(error = %err, stage = what, "Storage write failed");
    MlError::StorageWriteFailed {
        message: format!("Failed to store {}: {}", what, err),
        prediction: Box::new(prediction),
    }
}
