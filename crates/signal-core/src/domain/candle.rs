//! OHLCV 캔들과 캔들 시계열.
//!
//! 시장 데이터 공급자가 전달하는 불변 스냅샷입니다.
//! 모든 가격과 거래량은 `Decimal`로 표현합니다.

use crate::error::{SignalError, SignalResult};
use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV 캔들.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: Decimal,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 캔들 몸통 크기(절대값).
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 캔들 범위(고가 - 저가).
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 윗꼬리 길이.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// 아랫꼬리 길이.
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    /// 몸통 중간값.
    pub fn body_midpoint(&self) -> Decimal {
        (self.open + self.close) / Decimal::TWO
    }

    /// 양봉 여부.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉 여부.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 캔들 종료 시간 (시작 시간 + 타임프레임 기간).
    pub fn close_time(&self, timeframe: Timeframe) -> DateTime<Utc> {
        self.open_time + timeframe.chrono_duration()
    }

    /// 단일 캔들의 OHLCV 불변식을 검사합니다.
    ///
    /// # 인자
    /// * `index` - 시계열 내 위치 (에러 메시지용)
    pub fn validate(&self, index: usize) -> SignalResult<()> {
        let invalid = |reason: &str| SignalError::InvalidCandle {
            index,
            reason: reason.to_string(),
        };

        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return Err(invalid("가격은 0보다 커야 합니다"));
        }
        if self.high < self.open.max(self.close) {
            return Err(invalid("고가가 시가/종가보다 낮습니다"));
        }
        if self.low > self.open.min(self.close) {
            return Err(invalid("저가가 시가/종가보다 높습니다"));
        }
        if self.volume < Decimal::ZERO {
            return Err(invalid("거래량이 음수입니다"));
        }
        Ok(())
    }
}

/// 캔들 슬라이스 전체를 검사합니다.
///
/// 각 캔들의 불변식과 시작 시간의 엄격한 증가를 확인합니다.
pub fn validate_series(candles: &[Candle]) -> SignalResult<()> {
    for (index, candle) in candles.iter().enumerate() {
        candle.validate(index)?;
        if index > 0 && candle.open_time <= candles[index - 1].open_time {
            return Err(SignalError::InvalidCandle {
                index,
                reason: "시작 시간이 증가하지 않습니다".to_string(),
            });
        }
    }
    Ok(())
}

/// 하나의 (심볼, 타임프레임)에 대한 캔들 시계열 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 시간순 캔들
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    /// 새 시계열을 생성합니다.
    pub fn new(symbol: Symbol, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        Self {
            symbol,
            timeframe,
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// 마지막 캔들.
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn opens(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.open).collect()
    }

    pub fn highs(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// 시계열 전체를 검사합니다.
    pub fn validate(&self) -> SignalResult<()> {
        validate_series(&self.candles)
    }
}
