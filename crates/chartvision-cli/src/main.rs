//! 차트 패턴 분석 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기본 정책(vision_v1)으로 분석
//! chartvision analyze --symbol BTCUSDT
//!
//! # 휴리스틱 정책으로 분석
//! chartvision analyze --symbol ETHUSDT --policy heuristic_v1
//!
//! # 최근 48시간 패턴 조회
//! chartvision patterns --symbol BTCUSDT --hours 48
//!
//! # 최근 예측 5개 조회
//! chartvision predictions --symbol BTCUSDT --limit 5
//! ```

use chartvision_cli::{run_analyze, run_patterns, run_predictions};
use chartvision_core::{init_logging, AppConfig, LogConfig};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chartvision")]
#[command(about = "Chart pattern analysis - 차트 이미지 기반 패턴 인식 및 방향 예측", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: String,

    /// 로그 레벨 (설정 파일보다 우선)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 심볼을 분석하고 예측을 출력
    Analyze {
        /// 거래 심볼 (예: BTCUSDT)
        #[arg(short, long)]
        symbol: String,

        /// 결합 정책 (vision_v1, heuristic_v1)
        #[arg(short, long)]
        policy: Option<String>,
    },

    /// 캐시된 패턴 분석 결과 조회
    Patterns {
        /// 거래 심볼
        #[arg(short, long)]
        symbol: String,

        /// 조회 기간 (시간)
        #[arg(long, default_value = "24")]
        hours: i64,
    },

    /// 저장된 예측 조회
    Predictions {
        /// 거래 심볼
        #[arg(short, long)]
        symbol: String,

        /// 최대 개수
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Analyze { symbol, policy } => {
            run_analyze(&config, &symbol, policy.as_deref()).await
        }
        Commands::Patterns { symbol, hours } => run_patterns(&config, &symbol, hours).await,
        Commands::Predictions { symbol, limit } => {
            run_predictions(&config, &symbol, limit).await
        }
    }
}
