//! 기술적 분석 및 신호 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 기술적 지표 (EMA, MACD, ADX, RSI, 스토캐스틱, 볼린저, ATR, OBV, 피보나치)
//! - 캔들스틱 패턴, 다이버전스, 지지/저항 감지
//! - 타임프레임별 신호 생성
//! - 타임프레임 계층 정렬
//! - 신뢰도 및 예측 정확도 점수
//! - 거래 추천
//!
//! 모든 계산은 I/O 없는 순수 함수이며 같은 입력에 대해 같은 결과를 냅니다.
//!
//! # Re-exports
//!
//! - [`indicators`]: 지표 계산기 (IndicatorEngine 등)
//! - [`patterns`]: 패턴 감지기 (CandlestickDetector, DivergenceDetector 등)
//! - [`scoring`]: ConfidenceScorer, AccuracyTracker

pub mod hierarchy;
pub mod indicators;
pub mod patterns;
pub mod recommendation;
pub mod scoring;
pub mod series_window;
pub mod signal_generator;

// Indicators 모듈 re-exports
pub use indicators::{
    last_value,
    // 추세 지표
    AdxParams,
    AdxResult,
    // 변동성 지표
    AtrParams,
    BollingerBand,
    BollingerBandsParams,
    CrossKind,
    EmaParams,
    // 가격 레벨
    FibonacciLevels,
    IndicatorEngine,
    IndicatorError,
    IndicatorResult,
    MacdParams,
    MacdResult,
    // 모멘텀 지표
    RsiParams,
    SmaParams,
    StochasticParams,
    StochasticResult,
    SwingTrend,
    // 거래량 지표
    VolumeRatioParams,
};

// Patterns 모듈 re-exports
pub use patterns::{
    support_resistance, CandlestickDetector, CandlestickParams, DivergenceDetector,
    DivergenceParams, LevelParams, Oscillator, SupportResistance,
};

// 신호 생성기 re-export
pub use signal_generator::{risk_reward, SignalGenerator};

// 계층 정렬 re-export
pub use hierarchy::{Anchor, HierarchyAligner, TimeframeOutcome};

// Scoring re-export
pub use scoring::{AccuracyTracker, ConfidenceScorer, ScoredVote, VoteTally};

// 추천 re-export
pub use recommendation::{take_profit_ladder, RecommendationBuilder, TAKE_PROFIT_STEPS};

pub use series_window::SeriesWindow;
