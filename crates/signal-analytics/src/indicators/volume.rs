//! 거래량 지표.
//!
//! ## OBV (On-Balance Volume)
//! - 종가 상승: OBV += 거래량
//! - 종가 하락: OBV -= 거래량
//! - 종가 동일: 변화 없음
//!
//! ## 거래량 비율
//! 마지막 거래량 / 최근 `period`개 거래량의 평균

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ensure_length, ensure_period, IndicatorError, IndicatorResult};

/// 거래량 비율 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeRatioParams {
    pub period: usize,
}

impl Default for VolumeRatioParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// 거래량 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolumeIndicators;

impl VolumeIndicators {
    pub fn new() -> Self {
        Self
    }

    /// OBV. 첫 값은 0입니다.
    pub fn obv(&self, close: &[Decimal], volume: &[Decimal]) -> IndicatorResult<Vec<Decimal>> {
        if close.len() != volume.len() {
            return Err(IndicatorError::InvalidParameter(
                "종가와 거래량 데이터의 길이가 일치하지 않습니다".to_string(),
            ));
        }
        ensure_length(close.len(), 2)?;

        let mut running = Decimal::ZERO;
        let mut out = Vec::with_capacity(close.len());
        out.push(running);
        for i in 1..close.len() {
            match close[i].cmp(&close[i - 1]) {
                std::cmp::Ordering::Greater => running += volume[i],
                std::cmp::Ordering::Less => running -= volume[i],
                std::cmp::Ordering::Equal => {}
            }
            out.push(running);
        }
        Ok(out)
    }

    /// OBV 기울기 (최근 `lookback`개 캔들 동안의 변화량).
    pub fn obv_slope(&self, obv: &[Decimal], lookback: usize) -> IndicatorResult<Decimal> {
        ensure_period(lookback)?;
        ensure_length(obv.len(), lookback + 1)?;
        let last = obv.len() - 1;
        Ok(obv[last] - obv[last - lookback])
    }

    /// 거래량 비율.
    ///
    /// # 반환
    /// 평균 거래량이 0이면 비교 기준이 없으므로 `None`.
    pub fn volume_ratio(
        &self,
        volume: &[Decimal],
        params: VolumeRatioParams,
    ) -> IndicatorResult<Option<Decimal>> {
        ensure_period(params.period)?;
        ensure_length(volume.len(), params.period)?;

        let window = &volume[volume.len() - params.period..];
        let average = window.iter().sum::<Decimal>() / Decimal::from(params.period);
        if average.is_zero() {
            return Ok(None);
        }
        Ok(window.last().map(|last| *last / average))
    }
}
