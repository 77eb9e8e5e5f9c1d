//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 저장소/백엔드 구성 (설정 파일 기반)
//! - 분석 실행
//! - 저장된 패턴 및 예측 조회

pub mod commands;

pub use commands::*;
