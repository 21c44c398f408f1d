//! 방향성 지표 (ADX, +DI, -DI).
//!
//! 실제 범위와 방향 이동폭(+DM/-DM)을 Wilder 방식으로 평활하고,
//! DX의 Wilder 평균으로 ADX를 구합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::volatility::{true_ranges, wilder_smooth};
use super::{ensure_length, ensure_period, IndicatorResult};

/// ADX 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdxParams {
    pub period: usize,
}

impl Default for AdxParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 한 시점의 방향성 지표.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxResult {
    pub plus_di: Decimal,
    pub minus_di: Decimal,
    /// DX가 `period`개 쌓이기 전에는 `None`
    pub adx: Option<Decimal>,
}

/// 방향성 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectionalIndicators;

impl DirectionalIndicators {
    pub fn new() -> Self {
        Self
    }

    /// ADX.
    ///
    /// # 반환
    /// 입력과 같은 길이. +DI/-DI는 인덱스 `period`부터, ADX는 `2·period - 1`부터 존재합니다.
    /// 결과는 모두 [0, 100] 범위입니다.
    pub fn adx(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AdxParams,
    ) -> IndicatorResult<Vec<Option<AdxResult>>> {
        let period = params.period;
        ensure_period(period)?;
        let len = high.len().min(low.len()).min(close.len());
        ensure_length(len, 2 * period)?;

        let tr = true_ranges(&high[..len], &low[..len], &close[..len]);
        let (plus_dm, minus_dm): (Vec<Decimal>, Vec<Decimal>) = (1..len)
            .map(|i| {
                let up = high[i] - high[i - 1];
                let down = low[i - 1] - low[i];
                let plus = if up > down && up > Decimal::ZERO { up } else { Decimal::ZERO };
                let minus = if down > up && down > Decimal::ZERO { down } else { Decimal::ZERO };
                (plus, minus)
            })
            .unzip();

        let tr_s = wilder_sum(&tr, period);
        let plus_s = wilder_sum(&plus_dm, period);
        let minus_s = wilder_sum(&minus_dm, period);

        // 인덱스는 변화량 기준 (캔들 인덱스 - 1)
        let mut di: Vec<Option<(Decimal, Decimal)>> = Vec::with_capacity(tr.len());
        let mut dx: Vec<Decimal> = Vec::new();
        for i in 0..tr.len() {
            match (tr_s[i], plus_s[i], minus_s[i]) {
                (Some(t), Some(p), Some(m)) => {
                    let (pdi, mdi) = if t.is_zero() {
                        (Decimal::ZERO, Decimal::ZERO)
                    } else {
                        (p / t * Decimal::ONE_HUNDRED, m / t * Decimal::ONE_HUNDRED)
                    };
                    let sum = pdi + mdi;
                    dx.push(if sum.is_zero() {
                        Decimal::ZERO
                    } else {
                        (pdi - mdi).abs() / sum * Decimal::ONE_HUNDRED
                    });
                    di.push(Some((pdi, mdi)));
                }
                _ => di.push(None),
            }
        }

        let adx = wilder_smooth(&dx, period);
        let first_di = period - 1;

        let mut out = vec![None];
        for (i, entry) in di.into_iter().enumerate() {
            out.push(entry.map(|(plus_di, minus_di)| AdxResult {
                plus_di,
                minus_di,
                adx: adx.get(i - first_di).copied().flatten(),
            }));
        }
        Ok(out)
    }
}

/// Wilder 누적 평활 (첫 값 = 처음 `period`개 합, 이후 prev - prev/period + 현재).
fn wilder_sum(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    if values.len() < period {
        return vec![None; values.len()];
    }
    let p = Decimal::from(period);
    let mut prev: Decimal = values[..period].iter().sum();
    let mut out = vec![None; period - 1];
    out.push(Some(prev));
    for value in &values[period..] {
        prev = prev - prev / p + *value;
        out.push(Some(prev));
    }
    out
}
