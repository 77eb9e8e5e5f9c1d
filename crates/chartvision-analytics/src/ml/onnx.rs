//! ONNX Runtime 기반 패턴 분류 백엔드.
//!
//! 모델은 별도로 학습되어 ONNX 형식으로 내보내야 합니다.
//! - 입력: `[1, 3, 224, 224]` float32 텐서 (ImageNet 정규화)
//! - 출력: `[1, 10]` float32 logits (클래스 순서는 `PatternKind::CLASSES`)

use crate::ml::encoder::{ChartTensor, TensorContract};
use crate::ml::inference::{BackendOutput, PatternBackend};
use crate::ml::{MlError, MlResult};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::ValueType;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

/// ONNX 백엔드 설정.
#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// ONNX 모델 파일 경로
    pub model_path: PathBuf,
    /// 모델 버전 식별자
    pub model_version: String,
    /// 입력 텐서 계약
    pub contract: TensorContract,
}

impl OnnxConfig {
    pub fn new(model_path: impl Into<PathBuf>, model_version: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            model_version: model_version.into(),
            contract: TensorContract::IMAGENET_224,
        }
    }
}

/// ONNX 세션 백엔드.
///
/// `Session::run`은 가변 참조를 요구하므로 세션을 Mutex 하나로 감싸
/// 동시 추론을 직렬화합니다. 입력 이름과 형태는 로드 시 모델에서 읽습니다.
pub struct OnnxBackend {
    session: Mutex<Session>,
    config: OnnxConfig,
    input_name: String,
    input_shape: [usize; 4],
}

impl OnnxBackend {
    /// 모델 파일을 로드합니다. 실패는 모두 `ModelUnavailable`입니다.
    pub fn load(config: OnnxConfig) -> MlResult<Self> {
        let path = &config.model_path;

        if !path.exists() {
            return Err(MlError::ModelUnavailable(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        info!("Loading ONNX model from: {}", path.display());

        let session = Session::builder()
            .map_err(|e| MlError::ModelUnavailable(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MlError::ModelUnavailable(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| MlError::ModelUnavailable(format!("Failed to load model: {}", e)))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| MlError::ModelUnavailable("Model declares no inputs".to_string()))?;
        let input_name = input.name.clone();
        let declared: Vec<i64> = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
            _ => {
                return Err(MlError::ModelUnavailable(format!(
                    "Model input '{}' is not a tensor",
                    input_name
                )))
            }
        };
        let input_shape = config.contract.resolve_declared(&declared).ok_or_else(|| {
            MlError::ModelUnavailable(format!(
                "Model input '{}' has rank {}, expected NCHW",
                input_name,
                declared.len()
            ))
        })?;

        info!(
            model_version = %config.model_version,
            input = %input_name,
            shape = ?input_shape,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            config,
            input_name,
            input_shape,
        })
    }
}

impl PatternBackend for OnnxBackend {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn infer(&self, tensor: &ChartTensor) -> MlResult<BackendOutput> {
        let shape = tensor.shape().map(|d| d as i64);
        let input_tensor =
            ort::value::Tensor::from_array((shape, tensor.as_slice().to_vec().into_boxed_slice()))
                .map_err(|e| MlError::ModelUnavailable(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MlError::ModelUnavailable("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| MlError::ModelUnavailable(format!("Inference failed: {}", e)))?;

        let output_name = outputs
            .iter()
            .next()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| MlError::ModelUnavailable("No output tensor found".to_string()))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| MlError::ModelUnavailable("Failed to get output by name".to_string()))?;

        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MlError::ModelUnavailable(format!("Failed to extract output tensor: {}", e)))?;

        let logits = scores.to_vec();
        debug!(classes = logits.len(), "ONNX inference complete");

        Ok(BackendOutput::Logits(logits))
    }

    fn model_version(&self) -> &str {
        &self.config.model_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let config = OnnxConfig::new("nonexistent/model.onnx", "test");
        match OnnxBackend::load(config) {
            Err(MlError::ModelUnavailable(msg)) => assert!(msg.contains("not found")),
            _ => panic!("Expected ModelUnavailable error"),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = OnnxConfig::new("models/m.onnx", "v1");
        assert_eq!(config.model_version, "v1");
        assert_eq!(config.contract.shape(), [1, 3, 224, 224]);
    }
}
