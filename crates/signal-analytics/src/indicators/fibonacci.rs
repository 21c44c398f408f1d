//! 피보나치 되돌림/확장 레벨.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// 되돌림 비율 (%).
pub const RETRACEMENT_RATIOS: [Decimal; 7] = [
    dec!(0),
    dec!(23.6),
    dec!(38.2),
    dec!(50),
    dec!(61.8),
    dec!(78.6),
    dec!(100),
];

/// 확장 비율 (%).
pub const EXTENSION_RATIOS: [Decimal; 2] = [dec!(127.2), dec!(161.8)];

/// 측정 구간의 추세 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingTrend {
    /// 저점 → 고점 (되돌림은 고점에서 아래로)
    Up,
    /// 고점 → 저점 (되돌림은 저점에서 위로)
    Down,
}

/// 하나의 피보나치 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    /// 비율 (%)
    pub ratio: Decimal,
    pub price: Decimal,
}

/// 피보나치 레벨 묶음.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub high: Decimal,
    pub low: Decimal,
    pub trend: SwingTrend,
    pub retracements: Vec<FibonacciLevel>,
    pub extensions: Vec<FibonacciLevel>,
}

impl FibonacciLevels {
    /// 가격에 가장 가까운 되돌림 레벨.
    pub fn nearest_retracement(&self, price: Decimal) -> Option<FibonacciLevel> {
        self.retracements
            .iter()
            .copied()
            .min_by_key(|level| (level.price - price).abs())
    }

    /// 특정 비율의 되돌림 가격.
    pub fn retracement(&self, ratio: Decimal) -> Option<Decimal> {
        self.retracements
            .iter()
            .find(|level| level.ratio == ratio)
            .map(|level| level.price)
    }
}

/// 고점/저점 쌍에서 피보나치 레벨을 계산합니다.
///
/// 상승 구간은 고점에서 아래로, 하락 구간은 저점에서 위로 되돌림을 측정합니다.
/// 확장은 추세 방향으로 구간 폭을 연장합니다.
///
/// # 인자
/// * `high` - 구간 고점 (저점보다 커야 함)
/// * `low` - 구간 저점
/// * `trend` - 구간의 방향
pub fn fibonacci_levels(
    high: Decimal,
    low: Decimal,
    trend: SwingTrend,
) -> IndicatorResult<FibonacciLevels> {
    if high <= low {
        return Err(IndicatorError::InvalidParameter(format!(
            "고점({})은 저점({})보다 커야 합니다",
            high, low
        )));
    }

    let span = high - low;
    let level = |ratio: Decimal, from: Decimal, sign: Decimal| FibonacciLevel {
        ratio,
        price: from + sign * span * ratio / Decimal::ONE_HUNDRED,
    };

    let (origin, sign, ext_origin) = match trend {
        SwingTrend::Up => (high, Decimal::NEGATIVE_ONE, low),
        SwingTrend::Down => (low, Decimal::ONE, high),
    };

    Ok(FibonacciLevels {
        high,
        low,
        trend,
        retracements: RETRACEMENT_RATIOS
            .iter()
            .map(|r| level(*r, origin, sign))
            .collect(),
        extensions: EXTENSION_RATIOS
            .iter()
            .map(|r| level(*r, ext_origin, -sign))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptrend_retracements() {
        let levels = fibonacci_levels(dec!(200), dec!(100), SwingTrend::Up).unwrap();
        assert_eq!(levels.retracement(dec!(0)), Some(dec!(200)));
        assert_eq!(levels.retracement(dec!(50)), Some(dec!(150)));
        assert_eq!(levels.retracement(dec!(61.8)), Some(dec!(138.2)));
        assert_eq!(levels.retracement(dec!(100)), Some(dec!(100)));
        assert_eq!(levels.extensions[0].price, dec!(227.2));
        assert_eq!(levels.extensions[1].price, dec!(261.8));
    }

    #[test]
    fn test_downtrend_retracements() {
        let levels = fibonacci_levels(dec!(200), dec!(100), SwingTrend::Down).unwrap();
        assert_eq!(levels.retracement(dec!(0)), Some(dec!(100)));
        assert_eq!(levels.retracement(dec!(23.6)), Some(dec!(123.6)));
        assert_eq!(levels.extensions[0].price, dec!(72.8));
    }

    #[test]
    fn test_invalid_range() {
        assert!(matches!(
            fibonacci_levels(dec!(100), dec!(100), SwingTrend::Up),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_nearest_retracement() {
        let levels = fibonacci_levels(dec!(200), dec!(100), SwingTrend::Up).unwrap();
        let nearest = levels.nearest_retracement(dec!(140)).unwrap();
        assert_eq!(nearest.ratio, dec!(61.8));
    }
}
