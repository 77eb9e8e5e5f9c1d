//! 패턴 추론 어댑터.
//!
//! 분류 백엔드는 "계약 형태의 텐서 → 클래스별 점수" 기능만 제공하고,
//! 어댑터가 softmax, top-1 선택, 방향 매핑을 담당합니다.
//!
//! # 백엔드
//!
//! - [`PlaceholderBackend`]: 학습된 모델 이전에 쓰던 고정 감지 결과
//! - [`StaticScoresBackend`]: 고정 출력을 반환하는 테스트/임베딩용 백엔드
//! - `OnnxBackend` (`ml` feature): ONNX Runtime 기반 학습 모델

use crate::ml::encoder::{ChartTensor, TensorContract};
use crate::ml::{MlError, MlResult};
use chartvision_core::{PatternDetection, PatternKind, PatternRegion};
use std::sync::Arc;
use tracing::{debug, info};

/// 백엔드 추론 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutput {
    /// 정규화되지 않은 클래스별 점수 (어댑터가 softmax 적용)
    Logits(Vec<f32>),
    /// 이미 정규화된 클래스별 확률
    Probabilities(Vec<f32>),
    /// 백엔드가 직접 만든 감지 결과
    Detections(Vec<PatternDetection>),
}

/// 분류 백엔드 trait.
///
/// 여러 분석 호출에서 동시에 사용되므로 `&self`로 추론해야 합니다.
/// 스레드 안전하지 않은 런타임은 내부에서 접근을 직렬화합니다.
pub trait PatternBackend: Send + Sync {
    /// 기대 입력 형태 `[N, C, H, W]`.
    fn input_shape(&self) -> [usize; 4];

    /// 텐서에 대해 추론합니다. 추론 실패는 `ModelUnavailable`입니다.
    fn infer(&self, tensor: &ChartTensor) -> MlResult<BackendOutput>;

    /// 모델 버전 식별자.
    fn model_version(&self) -> &str;
}

/// 수치적으로 안정적인 softmax.
pub fn softmax(scores: &[f32]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let max_val = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exp_vals: Vec<f64> = scores.iter().map(|&s| (s as f64 - max_val).exp()).collect();
    let exp_sum: f64 = exp_vals.iter().sum();
    exp_vals.into_iter().map(|e| e / exp_sum).collect()
}

// =============================================================================
// 어댑터
// =============================================================================

/// 패턴 분류기.
///
/// 백엔드가 로드되지 않은 상태로도 생성할 수 있으며, 이 경우
/// `classify`는 `ModelUnavailable`을 반환합니다.
#[derive(Clone)]
pub struct PatternClassifier {
    backend: Option<Arc<dyn PatternBackend>>,
    contract: TensorContract,
}

impl std::fmt::Debug for PatternClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternClassifier")
            .field("model_version", &self.model_version())
            .field("contract", &self.contract)
            .finish()
    }
}

impl PatternClassifier {
    /// 백엔드 없는 분류기.
    pub fn unloaded(contract: TensorContract) -> Self {
        Self {
            backend: None,
            contract,
        }
    }

    /// 백엔드를 연결합니다. 입력 형태가 계약과 다르면 `ModelUnavailable`.
    pub fn with_backend(
        backend: Arc<dyn PatternBackend>,
        contract: TensorContract,
    ) -> MlResult<Self> {
        if !contract.is_rgb() {
            return Err(MlError::ModelUnavailable(format!(
                "Contract with {} channels cannot be rendered from an RGB chart",
                contract.channels
            )));
        }

        let expected = contract.shape();
        let actual = backend.input_shape();
        if actual != expected {
            return Err(MlError::ModelUnavailable(format!(
                "Backend input shape {:?} incompatible with contract {:?}",
                actual, expected
            )));
        }

        info!(model_version = backend.model_version(), "Pattern backend attached");

        Ok(Self {
            backend: Some(backend),
            contract,
        })
    }

    /// 플레이스홀더 백엔드를 사용하는 분류기.
    pub fn placeholder() -> Self {
        let contract = TensorContract::IMAGENET_224;
        Self {
            backend: Some(Arc::new(PlaceholderBackend::new(contract))),
            contract,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.is_some()
    }

    /// 백엔드 모델 버전. 미로드 시 `"none"`.
    pub fn model_version(&self) -> &str {
        self.backend
            .as_deref()
            .map(|b| b.model_version())
            .unwrap_or("none")
    }

    pub fn contract(&self) -> &TensorContract {
        &self.contract
    }

    /// 텐서를 분류하여 감지 결과를 반환합니다.
    pub fn classify(&self, tensor: &ChartTensor) -> MlResult<Vec<PatternDetection>> {
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| MlError::ModelUnavailable("No pattern backend loaded".to_string()))?;

        if tensor.shape() != self.contract.shape() {
            return Err(MlError::EncodingFailed(format!(
                "Tensor shape {:?} violates contract {:?}",
                tensor.shape(),
                self.contract.shape()
            )));
        }

        let detections = match backend.infer(tensor)? {
            BackendOutput::Logits(logits) => {
                vec![self.top_detection(&logits, softmax(&logits))?]
            }
            BackendOutput::Probabilities(probs) => {
                let probabilities = probs.iter().map(|&p| p as f64).collect();
                vec![self.top_detection(&probs, probabilities)?]
            }
            BackendOutput::Detections(detections) => detections,
        };

        debug!(
            count = detections.len(),
            top = detections.first().map(|d| d.kind.as_str()).unwrap_or("none"),
            "Patterns classified"
        );

        Ok(detections)
    }

    /// 확률 분포에서 최상위 클래스를 감지 결과로 변환합니다.
    fn top_detection(&self, raw: &[f32], probabilities: Vec<f64>) -> MlResult<PatternDetection> {
        if raw.len() != PatternKind::class_count() {
            return Err(MlError::ModelUnavailable(format!(
                "Expected {} class scores, got {}",
                PatternKind::class_count(),
                raw.len()
            )));
        }
        if raw.iter().any(|s| !s.is_finite()) || probabilities.iter().any(|p| !p.is_finite()) {
            return Err(MlError::ModelUnavailable(
                "Backend produced non-finite scores".to_string(),
            ));
        }

        let (index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });

        let kind = PatternKind::from_class_index(index).ok_or_else(|| {
            MlError::ModelUnavailable(format!("Class index {} out of range", index))
        })?;

        let raw_scores = raw.iter().map(|&s| s as f64).collect();
        Ok(PatternDetection::new(kind, confidence, raw_scores)
            .with_region(PatternRegion::full(self.contract.width, self.contract.height)))
    }
}

// =============================================================================
// 백엔드 구현
// =============================================================================

/// 학습된 모델 이전의 고정 감지 결과를 반환하는 백엔드.
#[derive(Debug, Clone)]
pub struct PlaceholderBackend {
    contract: TensorContract,
}

impl PlaceholderBackend {
    pub const MODEL_VERSION: &'static str = "placeholder_v1";

    pub fn new(contract: TensorContract) -> Self {
        Self { contract }
    }

    fn one_hot(kind: PatternKind, confidence: f64) -> Vec<f64> {
        PatternKind::CLASSES
            .iter()
            .map(|&k| if k == kind { confidence } else { 0.0 })
            .collect()
    }
}

impl PatternBackend for PlaceholderBackend {
    fn input_shape(&self) -> [usize; 4] {
        self.contract.shape()
    }

    fn infer(&self, _tensor: &ChartTensor) -> MlResult<BackendOutput> {
        Ok(BackendOutput::Detections(vec![
            PatternDetection::new(
                PatternKind::BullishFlag,
                0.75,
                Self::one_hot(PatternKind::BullishFlag, 0.75),
            )
            .with_region(PatternRegion::new(100, 150, 200, 180)),
            PatternDetection::new(
                PatternKind::SupportResistance,
                0.68,
                Self::one_hot(PatternKind::SupportResistance, 0.68),
            )
            .with_region(PatternRegion::new(0, 120, 300, 125)),
        ]))
    }

    fn model_version(&self) -> &str {
        Self::MODEL_VERSION
    }
}

/// 고정 출력을 반환하는 백엔드.
#[derive(Debug, Clone)]
pub struct StaticScoresBackend {
    output: Option<BackendOutput>,
    shape: [usize; 4],
    model_version: String,
}

impl StaticScoresBackend {
    /// 항상 주어진 출력을 반환합니다.
    pub fn new(output: BackendOutput) -> Self {
        Self {
            output: Some(output),
            shape: TensorContract::IMAGENET_224.shape(),
            model_version: "static_v1".to_string(),
        }
    }

    /// 항상 추론에 실패하는 백엔드.
    pub fn failing() -> Self {
        Self {
            output: None,
            shape: TensorContract::IMAGENET_224.shape(),
            model_version: "static_failing".to_string(),
        }
    }

    /// 보고할 입력 형태 설정.
    pub fn with_input_shape(mut self, shape: [usize; 4]) -> Self {
        self.shape = shape;
        self
    }

    /// 모델 버전 설정.
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }
}

impl PatternBackend for StaticScoresBackend {
    fn input_shape(&self) -> [usize; 4] {
        self.shape
    }

    fn infer(&self, _tensor: &ChartTensor) -> MlResult<BackendOutput> {
        self.output
            .clone()
            .ok_or_else(|| MlError::ModelUnavailable("Inference failed".to_string()))
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}
