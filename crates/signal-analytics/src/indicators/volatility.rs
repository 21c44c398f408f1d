//! 변동성 지표.
//!
//! - Bollinger Bands (모집단 표준편차)
//! - ATR (Wilder 평활)

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_length, ensure_period, IndicatorError, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20)
    pub period: usize,
    /// 표준편차 배수 (기본: 2)
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2),
        }
    }
}

/// 한 시점의 볼린저 밴드.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBand {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    /// 밴드 내 위치 (0 = 하단, 1 = 상단). 밴드 폭이 0이면 0.5.
    pub percent_b: Decimal,
    /// (상단 - 하단) / 중간
    pub bandwidth: Decimal,
}

/// ATR 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtrParams {
    pub period: usize,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 변동성 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드.
    ///
    /// 중간 = SMA, 상단/하단 = 중간 ± k × σ.
    ///
    /// # 반환
    /// 입력과 같은 길이 (처음 `period - 1`개는 `None`)
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<Option<BollingerBand>>> {
        let period = params.period;
        ensure_period(period)?;
        ensure_length(prices.len(), period)?;

        let n = Decimal::from(period);
        let mut out = vec![None; period - 1];

        for (offset, window) in prices.windows(period).enumerate() {
            let price = prices[offset + period - 1];
            let middle = window.iter().sum::<Decimal>() / n;
            let variance = window
                .iter()
                .map(|p| (*p - middle) * (*p - middle))
                .sum::<Decimal>()
                / n;
            let sigma = variance.sqrt().ok_or_else(|| {
                IndicatorError::CalculationError(format!("제곱근 계산 실패: {}", variance))
            })?;

            let half_width = params.std_dev_multiplier * sigma;
            let upper = middle + half_width;
            let lower = middle - half_width;
            let width = upper - lower;

            out.push(Some(BollingerBand {
                upper,
                middle,
                lower,
                percent_b: if width.is_zero() {
                    dec!(0.5)
                } else {
                    (price - lower) / width
                },
                bandwidth: if middle.is_zero() {
                    Decimal::ZERO
                } else {
                    width / middle
                },
            }));
        }
        Ok(out)
    }

    /// ATR.
    ///
    /// 실제 범위는 두 번째 캔들부터 전 캔들 종가를 사용해 계산합니다.
    /// 첫 ATR은 처음 `period`개 실제 범위의 평균이고, 이후 Wilder 평활을 적용합니다.
    ///
    /// # 반환
    /// 입력과 같은 길이. 인덱스 `0..period`는 `None`.
    pub fn atr(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period)?;
        let len = high.len().min(low.len()).min(close.len());
        ensure_length(len, period + 1)?;

        let ranges = true_ranges(&high[..len], &low[..len], &close[..len]);
        let smoothed = wilder_smooth(&ranges, period);

        let mut out = vec![None];
        out.extend(smoothed);
        Ok(out)
    }

    /// 가격 대비 ATR 비율 (%).
    pub fn atr_percent(&self, atr: Decimal, price: Decimal) -> IndicatorResult<Decimal> {
        if price <= Decimal::ZERO {
            return Err(IndicatorError::InvalidParameter(format!(
                "가격은 0보다 커야 합니다: {}",
                price
            )));
        }
        Ok(atr / price * Decimal::ONE_HUNDRED)
    }
}

/// 인덱스 1부터의 실제 범위 (길이 = 입력 - 1).
pub(crate) fn true_ranges(high: &[Decimal], low: &[Decimal], close: &[Decimal]) -> Vec<Decimal> {
    (1..high.len())
        .map(|i| {
            let prev_close = close[i - 1];
            (high[i] - low[i])
                .max((high[i] - prev_close).abs())
                .max((low[i] - prev_close).abs())
        })
        .collect()
}

/// Wilder 평균. 첫 값은 처음 `period`개의 단순 평균.
///
/// 반환 길이는 입력과 같고 처음 `period - 1`개는 `None`입니다.
pub(crate) fn wilder_smooth(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let p = Decimal::from(period);
    let mut prev = values[..period].iter().sum::<Decimal>() / p;
    let mut out = vec![None; period - 1];
    out.push(Some(prev));
    for value in &values[period..] {
        prev = (prev * (p - Decimal::ONE) + *value) / p;
        out.push(Some(prev));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_19_closes_insufficient() {
        let prices = vec![dec!(100); 19];
        let result = VolatilityIndicators::new().bollinger_bands(&prices, BollingerBandsParams::default());
        assert!(matches!(
            result,
            Err(IndicatorError::InsufficientData { required: 20, provided: 19 })
        ));
    }

    #[test]
    fn test_bollinger_population_sigma() {
        // 평균 5, 모집단 분산 4 → σ = 2
        let prices = vec![dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        let bands = VolatilityIndicators::new()
            .bollinger_bands(
                &prices,
                BollingerBandsParams {
                    period: 8,
                    std_dev_multiplier: dec!(2),
                },
            )
            .unwrap();
        let band = bands[7].unwrap();
        assert_eq!(band.middle, dec!(5));
        assert_eq!(band.upper.round_dp(10), dec!(9));
        assert_eq!(band.lower.round_dp(10), dec!(1));
        // 종가 9는 상단 밴드
        assert_eq!(band.percent_b.round_dp(10), dec!(1));
    }

    #[test]
    fn test_bollinger_flat_market() {
        let prices = vec![dec!(50); 20];
        let bands = VolatilityIndicators::new()
            .bollinger_bands(&prices, BollingerBandsParams::default())
            .unwrap();
        let band = bands[19].unwrap();
        assert_eq!(band.percent_b, dec!(0.5));
        assert_eq!(band.bandwidth, Decimal::ZERO);
    }

    #[test]
    fn test_atr_constant_range() {
        let high = vec![dec!(11); 16];
        let low = vec![dec!(9); 16];
        let close = vec![dec!(10); 16];
        let atr = VolatilityIndicators::new()
            .atr(&high, &low, &close, AtrParams::default())
            .unwrap();
        assert!(atr[..14].iter().all(Option::is_none));
        assert_eq!(atr[14], Some(dec!(2)));
        assert_eq!(atr[15], Some(dec!(2)));
    }

    #[test]
    fn test_atr_requires_period_plus_one() {
        let v = vec![dec!(10); 14];
        assert!(matches!(
            VolatilityIndicators::new().atr(&v, &v, &v, AtrParams::default()),
            Err(IndicatorError::InsufficientData { required: 15, provided: 14 })
        ));
    }

    #[test]
    fn test_atr_percent() {
        let vol = VolatilityIndicators::new();
        assert_eq!(vol.atr_percent(dec!(2), dec!(100)).unwrap(), dec!(2));
        assert!(vol.atr_percent(dec!(2), Decimal::ZERO).is_err());
    }
}
