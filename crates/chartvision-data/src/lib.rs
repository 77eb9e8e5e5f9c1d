//! 데이터 접근 및 저장.
//!
//! 이 crate는 분석 코어가 의존하는 외부 협력자 경계를 제공합니다:
//! - 시장 데이터 소스 (PostgreSQL)
//! - 결과 저장소 (Redis, TTL 기반 만료)
//! - 차트 이미지 blob 저장소 (파일시스템)
//! - 테스트 및 임베딩용 인메모리 구현

pub mod error;
pub mod storage;
pub mod store;

pub use error::{DataError, Result};
pub use store::{ChartStore, MarketDataSource, ResultStore};

// 저장소 구현 재내보내기
pub use storage::filesystem::FsChartStore;
pub use storage::memory::{InMemoryChartStore, InMemoryMarketData, InMemoryResultStore};
pub use storage::postgres::{Database, DatabaseConfig, PgMarketDataSource, PriceBarRecord};
pub use storage::redis::{RedisConfig, RedisResultStore};
