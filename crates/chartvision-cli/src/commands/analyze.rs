//! 분석 실행 명령.

use crate::commands::context::build_pipeline;
use anyhow::{bail, Result};
use chartvision_analytics::ErrorKind;
use chartvision_core::AppConfig;
use tracing::{error, info};

/// 심볼을 분석하고 예측을 JSON으로 출력합니다.
///
/// 저장에 실패하면 계산된 예측을 출력한 뒤 에러를 반환합니다.
pub async fn run_analyze(config: &AppConfig, symbol: &str, policy: Option<&str>) -> Result<()> {
    let pipeline = build_pipeline(config, policy).await?;

    match pipeline.analyze(symbol).await {
        Ok(prediction) => {
            info!(id = %prediction.id, direction = %prediction.direction, "Analysis complete");
            println!("{}", serde_json::to_string_pretty(&prediction)?);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::StorageWriteFailed => {
            error!(error = %e, "Prediction computed but not persisted");
            if let Some(prediction) = e.computed_prediction() {
                println!("{}", serde_json::to_string_pretty(prediction)?);
            }
            bail!(e)
        }
        Err(e) => Err(e.into()),
    }
}
