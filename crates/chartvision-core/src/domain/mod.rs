//! 도메인 모델.
//!
//! 분석 파이프라인이 주고받는 데이터 계약을 정의합니다:
//! - `market_data` - OHLCV 가격 바
//! - `pattern` - 패턴 종류, 방향, 감지 결과
//! - `prediction` - 감성 신호, 예측, 캐시 레코드

pub mod market_data;
pub mod pattern;
pub mod prediction;

pub use market_data::*;
pub use pattern::*;
pub use prediction::*;
