//! 모멘텀 지표.
//!
//! - RSI (Wilder 평활)
//! - Stochastic (%K 평활, %D)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ensure_length, ensure_period, IndicatorResult};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 스토캐스틱 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochasticParams {
    /// 최고/최저 범위 기간 (기본: 14)
    pub k_period: usize,
    /// %K 평활 기간 (기본: 3)
    pub smooth_k: usize,
    /// %D 기간 (기본: 3)
    pub d_period: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            k_period: 14,
            smooth_k: 3,
            d_period: 3,
        }
    }
}

impl StochasticParams {
    /// 첫 %D가 나오기 위한 최소 데이터 수.
    pub fn required(&self) -> usize {
        self.k_period + self.smooth_k + self.d_period - 2
    }
}

/// 한 시점의 스토캐스틱 값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticResult {
    /// 평활된 %K
    pub k: Option<Decimal>,
    /// %K의 이동평균
    pub d: Option<Decimal>,
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    pub fn new() -> Self {
        Self
    }

    /// RSI.
    ///
    /// 첫 평균 상승/하락폭은 처음 `period`개 변화량의 단순 평균이고,
    /// 이후는 Wilder 방식으로 평활합니다.
    ///
    /// # 반환
    /// 입력과 같은 길이. 인덱스 `0..period`는 `None`.
    /// 하락이 전혀 없으면 100, 변화가 전혀 없으면 50.
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period)?;
        ensure_length(prices.len(), period + 1)?;

        let p = Decimal::from(period);
        let changes: Vec<Decimal> = prices.windows(2).map(|w| w[1] - w[0]).collect();

        let mut avg_gain = changes[..period]
            .iter()
            .filter(|c| c.is_sign_positive())
            .sum::<Decimal>()
            / p;
        let mut avg_loss = changes[..period]
            .iter()
            .filter(|c| c.is_sign_negative())
            .map(|c| c.abs())
            .sum::<Decimal>()
            / p;

        let mut out = vec![None; period];
        out.push(Some(rsi_from_averages(avg_gain, avg_loss)));

        for change in &changes[period..] {
            let gain = (*change).max(Decimal::ZERO);
            let loss = (-*change).max(Decimal::ZERO);
            avg_gain = (avg_gain * (p - Decimal::ONE) + gain) / p;
            avg_loss = (avg_loss * (p - Decimal::ONE) + loss) / p;
            out.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        }
        Ok(out)
    }

    /// 스토캐스틱 오실레이터.
    ///
    /// 원시 %K = (종가 - 최저가) / (최고가 - 최저가) × 100, 범위가 0이면 50.
    /// %K = 원시 %K의 `smooth_k` SMA, %D = %K의 `d_period` SMA.
    pub fn stochastic(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: StochasticParams,
    ) -> IndicatorResult<Vec<StochasticResult>> {
        ensure_period(params.k_period)?;
        ensure_period(params.smooth_k)?;
        ensure_period(params.d_period)?;
        let len = high.len().min(low.len()).min(close.len());
        ensure_length(len, params.required())?;

        let raw_k: Vec<Option<Decimal>> = (0..len)
            .map(|i| {
                if i + 1 < params.k_period {
                    return None;
                }
                let from = i + 1 - params.k_period;
                let highest = high[from..=i].iter().copied().max()?;
                let lowest = low[from..=i].iter().copied().min()?;
                let range = highest - lowest;
                if range.is_zero() {
                    Some(Decimal::from(50))
                } else {
                    Some((close[i] - lowest) / range * Decimal::ONE_HUNDRED)
                }
            })
            .collect();

        let k = rolling_mean(&raw_k, params.smooth_k);
        let d = rolling_mean(&k, params.d_period);

        Ok(k.into_iter()
            .zip(d)
            .map(|(k, d)| StochasticResult { k, d })
            .collect())
    }
}

fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        if avg_gain.is_zero() {
            Decimal::from(50)
        } else {
            Decimal::ONE_HUNDRED
        }
    } else {
        let rs = avg_gain / avg_loss;
        Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
    }
}

/// `None`이 섞인 시계열의 이동평균. 창 안에 `None`이 있으면 `None`.
fn rolling_mean(values: &[Option<Decimal>], period: usize) -> Vec<Option<Decimal>> {
    let divisor = Decimal::from(period);
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            values[i + 1 - period..=i]
                .iter()
                .copied()
                .sum::<Option<Decimal>>()
                .map(|sum| sum / divisor)
        })
        .collect()
}
