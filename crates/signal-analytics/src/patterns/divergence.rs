//! 가격-오실레이터 다이버전스.
//!
//! 가장 최근 두 스윙 저점(또는 고점)을 비교합니다.
//! - 강세 다이버전스: 가격은 저점을 낮추고 오실레이터는 저점을 높임
//! - 약세 다이버전스: 가격은 고점을 높이고 오실레이터는 고점을 낮춤
//!
//! 오실레이터 극값은 가격 스윙 인덱스의 ±`match_tolerance` 캔들 안에서 찾습니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signal_core::{Candle, PatternFormation, PatternKind};

use super::{swing_highs, swing_lows};
use crate::indicators::{IndicatorError, IndicatorResult};

/// 다이버전스 감지 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DivergenceParams {
    /// 프랙탈 좌우 폭 (기본: 2, 즉 5캔들 프랙탈)
    pub fractal_span: usize,
    /// 오실레이터 극값 매칭 허용 범위 (기본: ±2캔들)
    pub match_tolerance: usize,
    /// 최소 캔들 수 (기본: 30)
    pub min_candles: usize,
}

impl Default for DivergenceParams {
    fn default() -> Self {
        Self {
            fractal_span: 2,
            match_tolerance: 2,
            min_candles: 30,
        }
    }
}

/// 비교 대상 오실레이터.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oscillator {
    Rsi,
    MacdHistogram,
}

impl Oscillator {
    fn kinds(&self) -> (PatternKind, PatternKind) {
        match self {
            Oscillator::Rsi => (
                PatternKind::BullishRsiDivergence,
                PatternKind::BearishRsiDivergence,
            ),
            Oscillator::MacdHistogram => (
                PatternKind::BullishMacdDivergence,
                PatternKind::BearishMacdDivergence,
            ),
        }
    }
}

/// 다이버전스 감지기.
#[derive(Debug, Default, Clone, Copy)]
pub struct DivergenceDetector {
    params: DivergenceParams,
}

impl DivergenceDetector {
    pub fn new(params: DivergenceParams) -> Self {
        Self { params }
    }

    /// 주어진 오실레이터 시계열과 가격의 다이버전스를 감지합니다.
    ///
    /// # 인자
    /// * `candles` - 캔들 창 (30개 이상)
    /// * `oscillator` - 캔들과 같은 길이의 오실레이터 값
    /// * `kind` - 오실레이터 종류 (패턴 이름 결정)
    pub fn detect(
        &self,
        candles: &[Candle],
        oscillator: &[Option<Decimal>],
        kind: Oscillator,
    ) -> IndicatorResult<Vec<PatternFormation>> {
        if candles.len() < self.params.min_candles {
            return Err(IndicatorError::InsufficientData {
                required: self.params.min_candles,
                provided: candles.len(),
            });
        }
        if oscillator.len() != candles.len() {
            return Err(IndicatorError::InvalidParameter(
                "오실레이터 길이가 캔들 수와 다릅니다".to_string(),
            ));
        }

        let (bullish_kind, bearish_kind) = kind.kinds();
        let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();
        let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();
        let mut found = Vec::new();

        if let Some((i1, i2)) = last_two(&swing_lows(&lows, self.params.fractal_span)) {
            let o1 = self.oscillator_extreme(oscillator, i1, false);
            let o2 = self.oscillator_extreme(oscillator, i2, false);
            if let (Some(o1), Some(o2)) = (o1, o2) {
                if lows[i2] < lows[i1] && o2 > o1 {
                    let projected = highs[i1..=i2].iter().copied().max();
                    let price_move = (lows[i1] - lows[i2]) / lows[i1] * Decimal::ONE_HUNDRED;
                    found.push(PatternFormation::new(
                        bullish_kind,
                        reliability(price_move, o1, o2, i2 - i1),
                        projected,
                        i2,
                        format!(
                            "가격 저점 {} → {}, 오실레이터 저점 {} → {}",
                            lows[i1],
                            lows[i2],
                            o1.round_dp(2),
                            o2.round_dp(2)
                        ),
                    ));
                }
            }
        }

        if let Some((i1, i2)) = last_two(&swing_highs(&highs, self.params.fractal_span)) {
            let o1 = self.oscillator_extreme(oscillator, i1, true);
            let o2 = self.oscillator_extreme(oscillator, i2, true);
            if let (Some(o1), Some(o2)) = (o1, o2) {
                if highs[i2] > highs[i1] && o2 < o1 {
                    let projected = lows[i1..=i2].iter().copied().min();
                    let price_move = (highs[i2] - highs[i1]) / highs[i1] * Decimal::ONE_HUNDRED;
                    found.push(PatternFormation::new(
                        bearish_kind,
                        reliability(price_move, o1, o2, i2 - i1),
                        projected,
                        i2,
                        format!(
                            "가격 고점 {} → {}, 오실레이터 고점 {} → {}",
                            highs[i1],
                            highs[i2],
                            o1.round_dp(2),
                            o2.round_dp(2)
                        ),
                    ));
                }
            }
        }

        Ok(found)
    }

    /// 스윙 인덱스 주변에서 오실레이터 극값을 찾습니다.
    fn oscillator_extreme(
        &self,
        oscillator: &[Option<Decimal>],
        index: usize,
        highest: bool,
    ) -> Option<Decimal> {
        let from = index.saturating_sub(self.params.match_tolerance);
        let to = (index + self.params.match_tolerance).min(oscillator.len() - 1);
        let values = oscillator[from..=to].iter().flatten().copied();
        if highest {
            values.max()
        } else {
            values.min()
        }
    }
}

fn last_two(indices: &[usize]) -> Option<(usize, usize)> {
    match indices {
        [.., a, b] => Some((*a, *b)),
        _ => None,
    }
}

/// 가격 이동폭(0~20), 오실레이터 이동폭(0~20), 극값 간격(10/20)을 기본값 40에 더합니다.
fn reliability(price_move_pct: Decimal, o1: Decimal, o2: Decimal, distance: usize) -> Decimal {
    let price_score = (price_move_pct * dec!(10)).min(dec!(20));
    let scale = o1.abs() + o2.abs();
    let osc_score = if scale.is_zero() {
        Decimal::ZERO
    } else {
        ((o2 - o1).abs() / scale * dec!(40)).min(dec!(20))
    };
    let distance_score = if (5..=30).contains(&distance) {
        dec!(20)
    } else {
        dec!(10)
    };
    (dec!(40) + price_score + osc_score + distance_score).round_dp(2)
}
