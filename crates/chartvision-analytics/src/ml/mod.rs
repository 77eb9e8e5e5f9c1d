//! 차트 패턴 인식 및 신호 결합.
//!
//! # 아키텍처
//!
//! ```text
//! Price Bars
//!     │
//!     ▼
//! ┌──────────────────┐
//! │ SeriesNormalizer │ ← 종가 → 단위 좌표
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  ChartEncoder    │ ← 래스터 → 텐서 + PNG
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐     ┌─────────────────────┐
//! │PatternClassifier │     │ Trend / Sentiment   │
//! │ (백엔드 교체 가능)│     │                     │
//! └────────┬─────────┘     └──────────┬──────────┘
//!          └────────────┬─────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │ FusionEngine  │ ← 정책별 가중 결합
//!               └───────────────┘
//! ```

pub mod encoder;
pub mod error;
pub mod fusion;
pub mod inference;
pub mod normalizer;
#[cfg(feature = "ml")]
pub mod onnx;
pub mod signals;

// 자주 사용되는 타입 재내보내기
pub use encoder::{storage_key, ChartEncoder, ChartTensor, EncodedChart, TensorContract};
pub use error::{ErrorKind, MlError, MlResult};
pub use fusion::{
    aggregate_patterns, FusionEngine, FusionOutcome, FusionPolicy, FusionWeights, TrendInput,
    TrendReference,
};
pub use inference::{
    softmax, BackendOutput, PatternBackend, PatternClassifier, PlaceholderBackend,
    StaticScoresBackend,
};
pub use normalizer::{NormalizedSeries, SeriesNormalizer, SeriesPoint, RANGE_EPSILON};
#[cfg(feature = "ml")]
pub use onnx::{OnnxBackend, OnnxConfig};
pub use signals::{
    FixedSentiment, RandomSentiment, SentimentBand, SentimentSource, TrendExtractor, TrendSignal,
};
