//! 기술적 지표 모듈.
//!
//! 모든 지표는 상태 없는 순수 함수이며, 같은 입력에 대해 항상 같은 결과를 반환합니다.
//! 시점별 출력은 입력과 같은 길이의 `Vec<Option<_>>`이며 창이 채워지기 전은 `None`입니다.
//! 데이터가 창보다 짧으면 근사값 대신 `InsufficientData` 에러를 반환합니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표
//! - **SMA**, **EMA**, **MACD**, 골든/데드 크로스
//! - **ADX** (+DI, -DI)
//!
//! ## 모멘텀 지표
//! - **RSI**: Wilder 평활
//! - **Stochastic**: %K 평활, %D
//!
//! ## 변동성 지표
//! - **Bollinger Bands**, **ATR**
//!
//! ## 거래량 지표
//! - **OBV**, 거래량 비율
//!
//! ## 가격 레벨
//! - **Fibonacci** 되돌림/확장
//!
//! # 사용 예시
//!
//! ```ignore
//! use signal_analytics::indicators::{IndicatorEngine, RsiParams};
//!
//! let engine = IndicatorEngine::new();
//! let rsi = engine.rsi(&closes, RsiParams::default())?;
//! ```

pub mod directional;
pub mod fibonacci;
pub mod momentum;
pub mod trend;
pub mod volatility;
pub mod volume;

use rust_decimal::Decimal;
use signal_core::SignalError;
use thiserror::Error;

pub use directional::{AdxParams, AdxResult, DirectionalIndicators};
pub use fibonacci::{fibonacci_levels, FibonacciLevel, FibonacciLevels, SwingTrend};
pub use momentum::{MomentumCalculator, RsiParams, StochasticParams, StochasticResult};
pub use trend::{CrossKind, EmaParams, MacdParams, MacdResult, SmaParams, TrendIndicators};
pub use volatility::{AtrParams, BollingerBand, BollingerBandsParams, VolatilityIndicators};
pub use volume::{VolumeIndicators, VolumeRatioParams};

/// 지표 계산 오류.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// 데이터 부족
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 계산 오류
    #[error("계산 오류: {0}")]
    CalculationError(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

impl From<IndicatorError> for SignalError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InsufficientData { required, provided } => {
                SignalError::InsufficientData { required, provided }
            }
            IndicatorError::InvalidParameter(msg) | IndicatorError::CalculationError(msg) => {
                SignalError::InvalidInput(msg)
            }
        }
    }
}

pub(crate) fn ensure_period(period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "기간은 0보다 커야 합니다".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_length(provided: usize, required: usize) -> IndicatorResult<()> {
    if provided < required {
        return Err(IndicatorError::InsufficientData { required, provided });
    }
    Ok(())
}

/// 통합 지표 엔진.
///
/// 지표 계산기들을 하나의 인터페이스로 묶습니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
    directional: DirectionalIndicators,
    volume: VolumeIndicators,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 추세 지표 ====================

    /// 단순 이동평균 (SMA).
    pub fn sma(&self, values: &[Decimal], params: SmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.sma(values, params)
    }

    /// 지수 이동평균 (EMA).
    pub fn ema(&self, values: &[Decimal], params: EmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.ema(values, params)
    }

    /// MACD 라인, 시그널, 히스토그램.
    pub fn macd(&self, values: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        self.trend.macd(values, params)
    }

    /// 최근 `lookback`개 캔들 내 마지막 이동평균 교차.
    pub fn last_cross(
        &self,
        short_ma: &[Option<Decimal>],
        long_ma: &[Option<Decimal>],
        lookback: usize,
    ) -> Option<(CrossKind, usize)> {
        self.trend.last_cross(short_ma, long_ma, lookback)
    }

    /// ADX, +DI, -DI.
    ///
    /// # 인자
    /// * `high` - 고가
    /// * `low` - 저가
    /// * `close` - 종가
    pub fn adx(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AdxParams,
    ) -> IndicatorResult<Vec<Option<AdxResult>>> {
        self.directional.adx(high, low, close, params)
    }

    // ==================== 모멘텀 지표 ====================

    /// RSI (0 ~ 100).
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.momentum.rsi(prices, params)
    }

    /// 스토캐스틱 %K, %D.
    pub fn stochastic(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: StochasticParams,
    ) -> IndicatorResult<Vec<StochasticResult>> {
        self.momentum.stochastic(high, low, close, params)
    }

    // ==================== 변동성 지표 ====================

    /// 볼린저 밴드.
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<Option<BollingerBand>>> {
        self.volatility.bollinger_bands(prices, params)
    }

    /// ATR.
    pub fn atr(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.volatility.atr(high, low, close, params)
    }

    /// 가격 대비 ATR (%).
    pub fn atr_percent(&self, atr: Decimal, price: Decimal) -> IndicatorResult<Decimal> {
        self.volatility.atr_percent(atr, price)
    }

    // ==================== 거래량 지표 ====================

    /// OBV.
    pub fn obv(&self, close: &[Decimal], volume: &[Decimal]) -> IndicatorResult<Vec<Decimal>> {
        self.volume.obv(close, volume)
    }

    /// OBV 기울기.
    pub fn obv_slope(&self, obv: &[Decimal], lookback: usize) -> IndicatorResult<Decimal> {
        self.volume.obv_slope(obv, lookback)
    }

    /// 거래량 비율 (평균 거래량이 0이면 `None`).
    pub fn volume_ratio(
        &self,
        volume: &[Decimal],
        params: VolumeRatioParams,
    ) -> IndicatorResult<Option<Decimal>> {
        self.volume.volume_ratio(volume, params)
    }

    // ==================== 가격 레벨 ====================

    /// 피보나치 되돌림/확장.
    pub fn fibonacci(
        &self,
        high: Decimal,
        low: Decimal,
        trend: SwingTrend,
    ) -> IndicatorResult<FibonacciLevels> {
        fibonacci_levels(high, low, trend)
    }
}

/// 시계열의 마지막 값.
pub fn last_value<T: Copy>(values: &[Option<T>]) -> Option<T> {
    values.last().copied().flatten()
}
