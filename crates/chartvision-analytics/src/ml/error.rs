//! ML 모듈 에러 타입.

use chartvision_core::{CoreError, Prediction};
use thiserror::Error;

/// 분석 파이프라인에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum MlError {
    /// 분석을 위한 데이터 부족
    #[error("Insufficient data: need {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// 차트 렌더링/텐서 생성 실패
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// 모델 미로드 또는 추론 실패
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// 차트 또는 결과 저장 실패. 계산된 예측을 함께 전달합니다.
    #[error("Storage write failed: {message}")]
    StorageWriteFailed {
        message: String,
        prediction: Box<Prediction>,
    },

    /// 유효하지 않은 심볼 또는 파라미터
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 시장 데이터 조회 실패
    #[error("Market data error: {0}")]
    MarketData(String),
}

/// ML 작업을 위한 Result 타입.
pub type MlResult<T> = Result<T, MlError>;

/// 호출자용 에러 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InsufficientData,
    EncodingFailed,
    ModelUnavailable,
    StorageWriteFailed,
    InvalidInput,
    MarketData,
}

impl MlError {
    /// 에러 분류를 반환합니다.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MlError::InsufficientData { .. } => ErrorKind::InsufficientData,
            MlError::EncodingFailed(_) => ErrorKind::EncodingFailed,
            MlError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            MlError::StorageWriteFailed { .. } => ErrorKind::StorageWriteFailed,
            MlError::InvalidInput(_) => ErrorKind::InvalidInput,
            MlError::MarketData(_) => ErrorKind::MarketData,
        }
    }

    /// 파이프라인 내부에서 복구 가능한 에러인지 확인.
    ///
    /// `ModelUnavailable`만 no_pattern 감지로 대체되어 복구됩니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MlError::ModelUnavailable(_))
    }

    /// 저장 실패 시 계산된 예측을 반환합니다.
    pub fn computed_prediction(&self) -> Option<&Prediction> {
        match self {
            MlError::StorageWriteFailed { prediction, .. } => Some(prediction.as_ref()),
            _ => None,
        }
    }

    /// 저장 실패 에러에서 예측을 꺼냅니다.
    pub fn into_computed_prediction(self) -> Option<Prediction> {
        match self {
            MlError::StorageWriteFailed { prediction, .. } => Some(*prediction),
            _ => None,
        }
    }
}

impl From<CoreError> for MlError {
    fn from(err: CoreError) -> Self {
        MlError::InvalidInput(err.to_string())
    }
}

impl From<image::ImageError> for MlError {
    fn from(err: image::ImageError) -> Self {
        MlError::EncodingFailed(err.to_string())
    }
}

// ONNX Runtime 에러로부터 변환
#[cfg(feature = "ml")]
impl From<ort::Error> for MlError {
    fn from(err: ort::Error) -> Self {
        MlError::ModelUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MlError::InsufficientData {
            required: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Insufficient data: need 2 bars, got 1");

        let err = MlError::ModelUnavailable("no backend loaded".to_string());
        assert_eq!(err.to_string(), "Model unavailable: no backend loaded");
    }

    #[test]
    fn test_error_recoverable() {
        assert!(MlError::ModelUnavailable("x".to_string()).is_recoverable());
        assert!(!MlError::EncodingFailed("x".to_string()).is_recoverable());
        assert!(!MlError::InsufficientData {
            required: 2,
            actual: 0
        }
        .is_recoverable());
    }

    #[test]
    fn test_kind_and_computed_prediction() {
        let err = MlError::InvalidInput("bad symbol".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.computed_prediction().is_none());
    }

    #[test]
    fn test_core_error_maps_to_invalid_input() {
        let err: MlError = CoreError::InvalidSymbol("??".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
