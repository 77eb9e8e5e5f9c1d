//! 차트 인코더.
//!
//! 정규화된 시계열을 하나의 래스터로 그린 뒤, 그 래스터에서 두 가지 산출물을
//! 만듭니다:
//! - 분류 모델 입력용 정규화 텐서 (NCHW, ImageNet mean/std)
//! - 감사/저장용 PNG 이미지
//!
//! 두 산출물은 같은 픽셀에서 파생되므로 저장된 이미지는 모델이 본 것과 일치합니다.
//! 인코딩 자체에는 난수가 없으며 같은 입력은 같은 텐서를 만듭니다.

use crate::ml::normalizer::NormalizedSeries;
use crate::ml::{MlError, MlResult};
use chartvision_core::Symbol;
use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// 분류 모델과 합의된 입력 텐서 계약.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorContract {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl TensorContract {
    /// 224×224 RGB, ImageNet 정규화.
    pub const IMAGENET_224: TensorContract = TensorContract {
        width: 224,
        height: 224,
        channels: 3,
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    /// NCHW 텐서 형태 `[1, C, H, W]`.
    pub fn shape(&self) -> [usize; 4] {
        [1, self.channels, self.height as usize, self.width as usize]
    }

    /// 전체 원소 수.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 래스터가 RGB이므로 채널 수가 3이어야 합니다.
    pub fn is_rgb(&self) -> bool {
        self.channels == 3
    }

    /// 모델이 선언한 입력 형태를 확정합니다.
    ///
    /// 동적 차원(0 이하)은 계약의 값으로 채웁니다. 랭크가 4가 아니면 `None`.
    pub fn resolve_declared(&self, declared: &[i64]) -> Option<[usize; 4]> {
        if declared.len() != 4 {
            return None;
        }

        let expected = self.shape();
        let mut resolved = [0usize; 4];
        for (i, &dim) in declared.iter().enumerate() {
            resolved[i] = if dim <= 0 { expected[i] } else { dim as usize };
        }
        Some(resolved)
    }
}

impl Default for TensorContract {
    fn default() -> Self {
        Self::IMAGENET_224
    }
}

/// 분류 모델 입력 텐서 (NCHW, f32).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl ChartTensor {
    /// 형태와 데이터 길이가 맞는지 검증하여 생성합니다.
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> MlResult<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(MlError::EncodingFailed(format!(
                "Tensor data length {} does not match shape {:?}",
                data.len(),
                shape
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// 인코딩 결과.
#[derive(Debug, Clone)]
pub struct EncodedChart {
    /// 모델 입력 텐서
    pub tensor: ChartTensor,
    /// 같은 래스터의 PNG 인코딩
    pub png: Vec<u8>,
    /// blob 저장소 키
    pub storage_key: String,
}

// 같은 마이크로초에 생성된 키를 구분하기 위한 프로세스 전역 카운터
static CHART_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 차트 이미지 저장 키를 생성합니다.
///
/// 형식: `charts/{SYMBOL}/{YYYYmmdd_HHMMSS_ffffff}_{seq}.png`
pub fn storage_key(symbol: &Symbol, created_at: DateTime<Utc>) -> String {
    let seq = CHART_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "charts/{}/{}_{}.png",
        symbol,
        created_at.format("%Y%m%d_%H%M%S_%6f"),
        seq
    )
}

/// 차트 인코더.
#[derive(Debug, Clone)]
pub struct ChartEncoder {
    contract: TensorContract,
    margin: u32,
    line_width: u32,
    background: Rgb<u8>,
    line_color: Rgb<u8>,
}

impl Default for ChartEncoder {
    fn default() -> Self {
        Self {
            contract: TensorContract::IMAGENET_224,
            margin: 2,
            line_width: 2,
            background: Rgb([255, 255, 255]),
            line_color: Rgb([0, 0, 255]),
        }
    }
}

impl ChartEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 텐서 계약 설정.
    pub fn with_contract(mut self, contract: TensorContract) -> Self {
        self.contract = contract;
        self
    }

    pub fn contract(&self) -> &TensorContract {
        &self.contract
    }

    /// 시계열을 텐서와 PNG로 인코딩합니다.
    ///
    /// 실패 시 어떤 상태도 외부에 기록하지 않습니다.
    pub fn encode(
        &self,
        series: &NormalizedSeries,
        symbol: &Symbol,
        created_at: DateTime<Utc>,
    ) -> MlResult<EncodedChart> {
        let image = self.render(series)?;
        let tensor = self.to_tensor(&image)?;
        let png = encode_png(&image)?;
        let storage_key = storage_key(symbol, created_at);

        debug!(
            points = series.len(),
            png_bytes = png.len(),
            key = %storage_key,
            "Chart encoded"
        );

        Ok(EncodedChart {
            tensor,
            png,
            storage_key,
        })
    }

    /// 시계열을 래스터로 그립니다.
    ///
    /// 포인트가 하나면 점 하나를 그립니다.
    pub fn render(&self, series: &NormalizedSeries) -> MlResult<RgbImage> {
        if series.is_empty() {
            return Err(MlError::EncodingFailed("Cannot render an empty series".to_string()));
        }

        let TensorContract { width, height, .. } = self.contract;
        let plot_w = width as i64 - 2 * self.margin as i64 - 2;
        let plot_h = height as i64 - 2 * self.margin as i64 - 4;
        if plot_w <= 0 || plot_h <= 0 {
            return Err(MlError::EncodingFailed(format!(
                "Canvas {}x{} too small for margin {}",
                width, height, self.margin
            )));
        }

        let mut image = RgbImage::from_pixel(width, height, self.background);
        let margin = self.margin as f64;
        let pixels: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|p| {
                if !p.x.is_finite() || !p.y.is_finite() {
                    return Err(MlError::EncodingFailed(format!(
                        "Non-finite coordinate at index {}",
                        p.index
                    )));
                }
                Ok((margin + p.x * plot_w as f64, margin + p.y * plot_h as f64))
            })
            .collect::<MlResult<_>>()?;

        match pixels.as_slice() {
            [(x, y)] => self.stamp(&mut image, *x, *y),
            _ => {
                for segment in pixels.windows(2) {
                    self.draw_segment(&mut image, segment[0], segment[1]);
                }
            }
        }

        Ok(image)
    }

    /// 래스터를 계약에 맞는 정규화 텐서로 변환합니다.
    pub fn to_tensor(&self, image: &RgbImage) -> MlResult<ChartTensor> {
        let contract = &self.contract;
        if !contract.is_rgb() {
            return Err(MlError::EncodingFailed(format!(
                "Tensor contract expects {} channels, raster has 3",
                contract.channels
            )));
        }
        if image.width() != contract.width || image.height() != contract.height {
            return Err(MlError::EncodingFailed(format!(
                "Image {}x{} does not match tensor contract {}x{}",
                image.width(),
                image.height(),
                contract.width,
                contract.height
            )));
        }

        let mut data = Vec::with_capacity(contract.len());

        // CHW
        for c in 0..contract.channels {
            for y in 0..contract.height {
                for x in 0..contract.width {
                    let value = image.get_pixel(x, y).0[c] as f32 / 255.0;
                    data.push((value - contract.mean[c]) / contract.std[c]);
                }
            }
        }

        ChartTensor::new(contract.shape(), data)
    }

    fn draw_segment(&self, image: &mut RgbImage, from: (f64, f64), to: (f64, f64)) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            self.stamp(image, from.0 + t * dx, from.1 + t * dy);
        }
    }

    /// 선 두께만큼의 정사각형 점을 찍습니다.
    fn stamp(&self, image: &mut RgbImage, x: f64, y: f64) {
        let (w, h) = (image.width(), image.height());
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        for py in y0..(y0 + self.line_width).min(h) {
            for px in x0..(x0 + self.line_width).min(w) {
                image.put_pixel(px, py, self.line_color);
            }
        }
    }
}

fn encode_png(image: &RgbImage) -> MlResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
