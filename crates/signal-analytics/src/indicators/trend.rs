//! 추세 지표.
//!
//! - SMA (단순 이동평균)
//! - EMA (지수 이동평균, SMA 시드)
//! - MACD (이동평균 수렴/확산)
//! - 골든/데드 크로스 감지

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ensure_length, ensure_period, IndicatorError, IndicatorResult};

/// SMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmaParams {
    pub period: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmaParams {
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12)
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26)
    pub slow_period: usize,
    /// 시그널 EMA 기간 (기본: 9)
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdParams {
    /// 첫 히스토그램이 나오기 위한 최소 데이터 수.
    pub fn required(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }
}

/// 한 시점의 MACD 값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    /// MACD 라인 (단기 EMA - 장기 EMA)
    pub macd: Option<Decimal>,
    /// 시그널 라인 (MACD 라인의 EMA)
    pub signal: Option<Decimal>,
    /// 히스토그램 (MACD - 시그널)
    pub histogram: Option<Decimal>,
}

/// 이동평균 교차 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossKind {
    /// 단기선이 장기선을 상향 돌파
    Golden,
    /// 단기선이 장기선을 하향 돌파
    Dead,
}

/// 추세 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendIndicators;

impl TrendIndicators {
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균.
    ///
    /// 누적 합을 밀어가며 계산합니다. 처음 `period - 1`개는 `None`.
    pub fn sma(&self, values: &[Decimal], params: SmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period)?;
        ensure_length(values.len(), period)?;

        let divisor = Decimal::from(period);
        let mut window_sum: Decimal = values[..period].iter().sum();
        let mut out = vec![None; period - 1];
        out.push(Some(window_sum / divisor));

        for i in period..values.len() {
            window_sum += values[i] - values[i - period];
            out.push(Some(window_sum / divisor));
        }
        Ok(out)
    }

    /// 지수 이동평균.
    ///
    /// k = 2 / (period + 1), 첫 값은 처음 `period`개의 단순 평균입니다.
    ///
    /// # 반환
    /// 입력과 같은 길이의 벡터 (처음 `period - 1`개는 `None`)
    pub fn ema(&self, values: &[Decimal], params: EmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period)?;
        ensure_length(values.len(), period)?;

        let k = Decimal::TWO / Decimal::from(period + 1);
        let seed = values[..period].iter().sum::<Decimal>() / Decimal::from(period);

        let mut out = Vec::with_capacity(values.len());
        out.resize(period - 1, None);
        out.push(Some(seed));

        let mut prev = seed;
        for value in &values[period..] {
            prev = (*value - prev) * k + prev;
            out.push(Some(prev));
        }
        Ok(out)
    }

    /// MACD.
    ///
    /// 시그널 라인은 MACD 라인이 처음 정의되는 지점부터 EMA를 적용합니다.
    /// 따라서 최소 `slow + signal - 1`개의 데이터가 필요합니다.
    pub fn macd(&self, values: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        if params.fast_period == 0 || params.signal_period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "기간은 0보다 커야 합니다".to_string(),
            ));
        }
        if params.fast_period >= params.slow_period {
            return Err(IndicatorError::InvalidParameter(format!(
                "단기 기간({})은 장기 기간({})보다 작아야 합니다",
                params.fast_period, params.slow_period
            )));
        }
        ensure_length(values.len(), params.required())?;

        let fast = self.ema(values, EmaParams { period: params.fast_period })?;
        let slow = self.ema(values, EmaParams { period: params.slow_period })?;

        let start = params.slow_period - 1;
        let line: Vec<Decimal> = (start..values.len())
            .filter_map(|i| Some(fast[i]? - slow[i]?))
            .collect();
        let signal = self.ema(&line, EmaParams { period: params.signal_period })?;

        let mut out = vec![
            MacdResult {
                macd: None,
                signal: None,
                histogram: None,
            };
            start
        ];
        for (macd, signal) in line.iter().zip(signal) {
            out.push(MacdResult {
                macd: Some(*macd),
                signal,
                histogram: signal.map(|s| *macd - s),
            });
        }
        Ok(out)
    }

    /// 각 시점의 교차 여부를 감지합니다.
    ///
    /// 이전 시점과 현재 시점의 대소 관계가 뒤집힌 경우만 교차로 봅니다.
    pub fn detect_crosses(
        &self,
        short_ma: &[Option<Decimal>],
        long_ma: &[Option<Decimal>],
    ) -> Vec<Option<CrossKind>> {
        let len = short_ma.len().min(long_ma.len());
        let mut out = vec![None; len];
        for i in 1..len {
            let (Some(ps), Some(pl), Some(cs), Some(cl)) =
                (short_ma[i - 1], long_ma[i - 1], short_ma[i], long_ma[i])
            else {
                continue;
            };
            if ps <= pl && cs > cl {
                out[i] = Some(CrossKind::Golden);
            } else if ps >= pl && cs < cl {
                out[i] = Some(CrossKind::Dead);
            }
        }
        out
    }

    /// 최근 `lookback`개 시점 안에서 가장 마지막 교차.
    ///
    /// # 반환
    /// (교차 종류, 경과 캔들 수)
    pub fn last_cross(
        &self,
        short_ma: &[Option<Decimal>],
        long_ma: &[Option<Decimal>],
        lookback: usize,
    ) -> Option<(CrossKind, usize)> {
        let crosses = self.detect_crosses(short_ma, long_ma);
        let len = crosses.len();
        crosses
            .iter()
            .enumerate()
            .rev()
            .take(lookback)
            .find_map(|(i, cross)| cross.map(|kind| (kind, len - 1 - i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ramp(n: usize) -> Vec<Decimal> {
        (1..=n).map(Decimal::from).collect()
    }

    #[test]
    fn test_sma_values() {
        let sma = TrendIndicators::new()
            .sma(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)], SmaParams { period: 3 })
            .unwrap();
        assert_eq!(sma, vec![None, None, Some(dec!(2)), Some(dec!(3)), Some(dec!(4))]);
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let ema = TrendIndicators::new()
            .ema(&[dec!(2), dec!(4), dec!(6), dec!(8)], EmaParams { period: 3 })
            .unwrap();
        assert_eq!(ema[1], None);
        assert_eq!(ema[2], Some(dec!(4)));
        // k = 0.5: (8 - 4) * 0.5 + 4
        assert_eq!(ema[3], Some(dec!(6)));
    }

    #[test]
    fn test_ema_insufficient_data() {
        let result = TrendIndicators::new().ema(&ramp(4), EmaParams { period: 5 });
        assert!(matches!(
            result,
            Err(IndicatorError::InsufficientData { required: 5, provided: 4 })
        ));
    }

    #[test]
    fn test_macd_requirement_boundary() {
        let trend = TrendIndicators::new();
        let params = MacdParams::default();

        assert!(matches!(
            trend.macd(&ramp(33), params),
            Err(IndicatorError::InsufficientData { required: 34, provided: 33 })
        ));

        let macd = trend.macd(&ramp(34), params).unwrap();
        assert_eq!(macd.len(), 34);
        assert!(macd[32].histogram.is_none());
        assert!(macd[33].histogram.is_some());
        // 상승 추세에서 MACD 라인은 양수
        assert!(macd[33].macd.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        let params = MacdParams {
            fast_period: 26,
            slow_period: 12,
            signal_period: 9,
        };
        assert!(matches!(
            TrendIndicators::new().macd(&ramp(60), params),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cross_detection() {
        let short = vec![Some(dec!(1)), Some(dec!(2)), Some(dec!(4)), Some(dec!(2))];
        let long = vec![Some(dec!(3)), Some(dec!(3)), Some(dec!(3)), Some(dec!(3))];
        let trend = TrendIndicators::new();

        let crosses = trend.detect_crosses(&short, &long);
        assert_eq!(crosses, vec![None, None, Some(CrossKind::Golden), Some(CrossKind::Dead)]);
        assert_eq!(trend.last_cross(&short, &long, 5), Some((CrossKind::Dead, 0)));
        assert_eq!(trend.last_cross(&short[..3], &long[..3], 1), Some((CrossKind::Golden, 0)));
    }
}
