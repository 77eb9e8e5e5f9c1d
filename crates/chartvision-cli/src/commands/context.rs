//! 설정에서 파이프라인과 저장소를 구성합니다.

use anyhow::{bail, Context, Result};
use chartvision_analytics::{FusionPolicy, PatternClassifier, PatternPipeline, TensorContract};
use chartvision_core::{AppConfig, BackendKind, ModelConfig};
use chartvision_data::{
    Database, DatabaseConfig, FsChartStore, PgMarketDataSource, RedisConfig, RedisResultStore,
};
use std::sync::Arc;
use tracing::{error, info};

/// 결과 저장소(Redis)에 연결합니다.
pub async fn connect_results(config: &AppConfig) -> Result<Arc<RedisResultStore>> {
    let redis = RedisConfig {
        url: config.storage.redis_url.clone(),
    };
    let store = RedisResultStore::connect(&redis)
        .await
        .context("Failed to connect to result store")?;
    if !store
        .health_check()
        .await
        .context("Result store health check failed")?
    {
        bail!("Result store did not answer PING");
    }
    Ok(Arc::new(store))
}

/// 설정된 백엔드로 분류기를 만듭니다.
///
/// 백엔드를 로드할 수 없으면 에러를 기록하고 미로드 분류기를 반환합니다.
/// 이 경우 분석은 no_pattern 감지로 계속 진행됩니다.
pub fn build_classifier(model: &ModelConfig) -> PatternClassifier {
    match model.backend {
        BackendKind::Placeholder => PatternClassifier::placeholder(),
        BackendKind::None => PatternClassifier::unloaded(TensorContract::IMAGENET_224),
        BackendKind::Onnx => load_onnx(model),
    }
}

#[cfg(feature = "ml")]
fn load_onnx(model: &ModelConfig) -> PatternClassifier {
    use chartvision_analytics::{OnnxBackend, OnnxConfig};

    let config = OnnxConfig::new(&model.model_path, &model.model_version);
    let contract = config.contract;
    match OnnxBackend::load(config)
        .and_then(|backend| PatternClassifier::with_backend(Arc::new(backend), contract))
    {
        Ok(classifier) => classifier,
        Err(e) => {
            error!(error = %e, path = %model.model_path.display(), "Failed to load ONNX model");
            PatternClassifier::unloaded(contract)
        }
    }
}

#[cfg(not(feature = "ml"))]
fn load_onnx(model: &ModelConfig) -> PatternClassifier {
    error!(
        path = %model.model_path.display(),
        "ONNX backend requested but built without the `ml` feature"
    );
    PatternClassifier::unloaded(TensorContract::IMAGENET_224)
}

/// 전체 분석 파이프라인을 구성합니다.
pub async fn build_pipeline(config: &AppConfig, policy: Option<&str>) -> Result<PatternPipeline> {
    let db = Database::connect(&DatabaseConfig::new(&config.storage.database_url))
        .await
        .context("Failed to connect to market data database")?;
    let market_data = Arc::new(PgMarketDataSource::new(db));
    let results = connect_results(config).await?;
    let charts = Arc::new(FsChartStore::new(&config.storage.charts_dir));
    let classifier = build_classifier(&config.model);

    info!(
        backend = ?config.model.backend,
        model_version = classifier.model_version(),
        "Pipeline collaborators ready"
    );

    let mut pipeline = PatternPipeline::new(market_data, results, charts, classifier)
        .with_config(&config.pipeline)?;
    if let Some(name) = policy {
        pipeline = pipeline.with_policy(FusionPolicy::from_name(name)?);
    }
    Ok(pipeline)
}
