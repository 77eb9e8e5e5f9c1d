//! # Chartvision Core
//!
//! 차트 패턴 분석 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 가격 바(OHLCV) 데이터 구조체
//! - 심볼 정의 및 검증
//! - 패턴 감지, 예측, 캐시 레코드
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
