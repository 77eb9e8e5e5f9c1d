//! 저장된 결과 조회 명령.

use crate::commands::context::connect_results;
use anyhow::{anyhow, Result};
use chartvision_core::{AppConfig, Symbol};
use chartvision_data::ResultStore;
use chrono::{DateTime, TimeDelta, Utc};

/// 최근 `hours`시간의 캐시 레코드를 출력합니다.
pub async fn run_patterns(config: &AppConfig, symbol: &str, hours: i64) -> Result<()> {
    let symbol = Symbol::parse(symbol)?;
    let results = connect_results(config).await?;

    let since = lookback_start(Utc::now(), hours)?;
    let records = results.cache_records_since(&symbol, since).await?;

    println!("{}", serde_json::to_string_pretty(&records)?);
    eprintln!("{} record(s) for {} in the last {}h", records.len(), symbol, hours);
    Ok(())
}

/// `now`에서 `hours`시간 전의 epoch 초. 음수는 0시간으로 봅니다.
fn lookback_start(now: DateTime<Utc>, hours: i64) -> Result<i64> {
    TimeDelta::try_hours(hours.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .map(|start| start.timestamp())
        .ok_or_else(|| anyhow!("--hours {} is out of range", hours))
}

/// 최근 예측을 최대 `limit`개 출력합니다.
pub async fn run_predictions(config: &AppConfig, symbol: &str, limit: usize) -> Result<()> {
    let symbol = Symbol::parse(symbol)?;
    let results = connect_results(config).await?;

    let predictions = results.recent_predictions(&symbol, limit).await?;

    println!("{}", serde_json::to_string_pretty(&predictions)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lookback_start() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(lookback_start(now, 24).unwrap(), 1_700_000_000 - 86_400);
        assert_eq!(lookback_start(now, -5).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_huge_lookback_is_an_error() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(lookback_start(now, i64::MAX).is_err());
        assert!(lookback_start(now, 10_000_000_000).is_err());
    }
}
