//! # Chartvision Analytics
//!
//! 가격 바를 차트 이미지로 인코딩하고, 패턴 분류 결과와 추세/감성 신호를
//! 결합하여 방향성 예측을 만드는 분석 파이프라인입니다.
//!
//! # 예제
//!
//! ```ignore
//! use chartvision_analytics::{PatternClassifier, PatternPipeline};
//!
//! let pipeline = PatternPipeline::new(market_data, results, charts, PatternClassifier::placeholder());
//! let prediction = pipeline.analyze("BTCUSDT").await?;
//! println!("{} ({:.2})", prediction.direction, prediction.confidence);
//! ```

pub mod ml;
pub mod pipeline;

pub use ml::*;
pub use pipeline::{AnalysisReport, PatternPipeline, PipelineSettings};
