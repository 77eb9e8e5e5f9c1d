//! 가격 시계열 정규화.
//!
//! 종가 시계열을 인코딩용 단위 좌표로 변환합니다. x는 바 인덱스 기준으로
//! 균등 배치되며 (시간 간격은 반영하지 않음), y는 래스터 좌표계에 맞게
//! 위아래가 반전됩니다.

use crate::ml::{MlError, MlResult};
use chartvision_core::{is_ascending, DecimalExt, PriceBar};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 모든 가격이 같을 때 0 나눗셈을 피하기 위한 최소 범위.
pub const RANGE_EPSILON: f64 = 1e-9;

/// 정규화된 단일 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// 윈도우 내 바 인덱스
    pub index: usize,
    /// 종가
    pub price: f64,
    /// 수평 위치 (0.0 ~ 1.0, index / n)
    pub x: f64,
    /// 수직 위치 (0.0 = 최고가, 1.0 = 최저가)
    pub y: f64,
}

/// 정규화된 종가 시계열.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    pub points: Vec<SeriesPoint>,
    pub min_price: f64,
    pub max_price: f64,
    /// `max(max_price - min_price, ε)`
    pub range: f64,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 선을 그릴 수 없는 시계열 (포인트 2개 미만).
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// 종가 목록.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }
}

/// 시계열 정규화기.
///
/// 입력 바는 타임스탬프 오름차순이어야 합니다. 순서가 어긋난 입력은
/// 경고만 남기고 주어진 순서 그대로 처리합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesNormalizer;

impl SeriesNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 바 윈도우를 정규화합니다.
    ///
    /// 빈 입력은 `InsufficientData`를 반환합니다. 바가 하나뿐이면
    /// 단일 포인트의 축퇴 시계열을 반환하며, 최소 길이 검사는 호출자가 합니다.
    pub fn normalize(&self, bars: &[PriceBar]) -> MlResult<NormalizedSeries> {
        if bars.is_empty() {
            return Err(MlError::InsufficientData {
                required: 2,
                actual: 0,
            });
        }

        if !is_ascending(bars) {
            warn!(count = bars.len(), "Bars are not in ascending timestamp order");
        }

        let closes = bars
            .iter()
            .map(|bar| {
                bar.close.to_f64_checked().ok_or_else(|| {
                    MlError::InvalidInput(format!("Close price not representable: {}", bar.close))
                })
            })
            .collect::<MlResult<Vec<f64>>>()?;

        let min_price = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let max_price = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = (max_price - min_price).max(RANGE_EPSILON);
        let n = closes.len() as f64;

        let points = closes
            .into_iter()
            .enumerate()
            .map(|(index, price)| SeriesPoint {
                index,
                price,
                x: index as f64 / n,
                y: 1.0 - (price - min_price) / range,
            })
            .collect();

        Ok(NormalizedSeries {
            points,
            min_price,
            max_price,
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartvision_core::Symbol;
    use rust_decimal::Decimal;

    fn bars(closes: &[i64]) -> Vec<PriceBar> {
        let symbol = Symbol::parse("XYZUSD").unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let c = Decimal::from(c);
                PriceBar::new(symbol.clone(), i as i64 * 60, c, c, c, c, Decimal::ONE)
            })
            .collect()
    }

    #[test]
    fn test_empty_input_is_insufficient() {
        let result = SeriesNormalizer::new().normalize(&[]);
        assert!(matches!(
            result,
            Err(MlError::InsufficientData { required: 2, actual: 0 })
        ));
    }

    #[test]
    fn test_single_bar_is_degenerate() {
        let series = SeriesNormalizer::new().normalize(&bars(&[100])).unwrap();
        assert_eq!(series.len(), 1);
        assert!(series.is_degenerate());
    }

    #[test]
    fn test_min_max_and_inverted_y() {
        let series = SeriesNormalizer::new()
            .normalize(&bars(&[100, 150, 125]))
            .unwrap();
        assert_eq!(series.min_price, 100.0);
        assert_eq!(series.max_price, 150.0);
        assert_eq!(series.range, 50.0);

        // 최저가는 아래(1.0), 최고가는 위(0.0)
        assert_eq!(series.points[0].y, 1.0);
        assert_eq!(series.points[1].y, 0.0);
        assert!((series.points[2].y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_x_is_spaced_by_index() {
        let series = SeriesNormalizer::new()
            .normalize(&bars(&[1, 2, 3, 4]))
            .unwrap();
        let xs: Vec<f64> = series.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_flat_prices_use_epsilon_range() {
        let series = SeriesNormalizer::new()
            .normalize(&bars(&[42, 42, 42, 42]))
            .unwrap();
        assert_eq!(series.range, RANGE_EPSILON);
        assert!(series.points.iter().all(|p| p.y == 1.0));
    }
}
