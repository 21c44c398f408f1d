//! 패턴 및 다이버전스 감지.
//!
//! - 캔들스틱 패턴 (장악형, 도지, 샛별/석별, 망치형 계열)
//! - 가격과 오실레이터(RSI, MACD 히스토그램) 간 다이버전스
//! - 스윙 포인트 기반 지지/저항 레벨
//!
//! 스윙 포인트는 좌우 `span`개 캔들보다 극단인 값(프랙탈)으로 정의합니다.

pub mod candlestick;
pub mod divergence;
pub mod levels;

use rust_decimal::Decimal;

pub use candlestick::{CandlestickDetector, CandlestickParams};
pub use divergence::{DivergenceDetector, DivergenceParams, Oscillator};
pub use levels::{support_resistance, LevelParams, SupportResistance};

/// 스윙 고점 인덱스 (시간순).
pub fn swing_highs(values: &[Decimal], span: usize) -> Vec<usize> {
    fractal_indices(values, span, |center, other| center > other)
}

/// 스윙 저점 인덱스 (시간순).
pub fn swing_lows(values: &[Decimal], span: usize) -> Vec<usize> {
    fractal_indices(values, span, |center, other| center < other)
}

fn fractal_indices<F>(values: &[Decimal], span: usize, beats: F) -> Vec<usize>
where
    F: Fn(Decimal, Decimal) -> bool,
{
    if span == 0 || values.len() < 2 * span + 1 {
        return Vec::new();
    }
    (span..values.len() - span)
        .filter(|&i| {
            (i - span..=i + span)
                .filter(|&j| j != i)
                .all(|j| beats(values[i], values[j]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fractals() {
        let values = vec![
            dec!(5), dec!(4), dec!(3), dec!(4), dec!(5), dec!(6), dec!(7), dec!(6), dec!(5), dec!(6),
        ];
        assert_eq!(swing_lows(&values, 2), vec![2]);
        assert_eq!(swing_highs(&values, 2), vec![6]);
    }

    #[test]
    fn test_fractal_ties_are_not_swings() {
        let values = vec![dec!(5), dec!(4), dec!(3), dec!(3), dec!(4), dec!(5)];
        assert!(swing_lows(&values, 2).is_empty());
    }

    #[test]
    fn test_short_input() {
        assert!(swing_highs(&[dec!(1), dec!(2)], 2).is_empty());
    }
}
