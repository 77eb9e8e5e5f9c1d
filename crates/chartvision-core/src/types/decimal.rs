//! 가격 계산을 위한 Decimal 유틸리티.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 거래량 타입.
pub type Volume = Decimal;

/// 수치 계산 경계에서 Decimal을 f64로 변환하기 위한 확장 트레이트.
pub trait DecimalExt {
    /// f64로 변환합니다. 표현할 수 없는 값은 `None`.
    fn to_f64_checked(&self) -> Option<f64>;
}

impl DecimalExt for Decimal {
    fn to_f64_checked(&self) -> Option<f64> {
        self.to_f64().filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_f64_checked() {
        assert_eq!(dec!(150.25).to_f64_checked(), Some(150.25));
        assert_eq!(Decimal::ZERO.to_f64_checked(), Some(0.0));
    }
}
