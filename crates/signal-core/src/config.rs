//! 설정 관리.
//!
//! `config/default.toml`과 `SIGNAL__` 접두사 환경 변수에서 설정을 읽습니다.
//! 예: `SIGNAL__SCHEDULER__INTERVAL_SECS=60`

use crate::error::{SignalError, SignalResult};
use crate::types::{Symbol, Timeframe};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 레버리지 절대 상한 (배수).
pub const HARD_MAX_LEVERAGE: u32 = 20;

/// 엔진 전체 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 스케줄러 설정
    pub scheduler: SchedulerConfig,
    /// 신호 생성기 설정
    pub generator: GeneratorConfig,
    /// 타임프레임 정렬 설정
    pub alignment: AlignmentConfig,
    /// 정확도 추적 설정
    pub accuracy: AccuracyConfig,
    /// 거래 추천 설정
    pub recommendation: RecommendationConfig,
    /// 시장 데이터 설정
    pub data: DataConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 스케줄러 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 백그라운드 재계산 간격 (초)
    pub interval_secs: u64,
    /// 감시할 심볼
    pub symbols: Vec<String>,
    /// 계산할 타임프레임
    pub timeframes: Vec<String>,
    /// 타임프레임당 요청할 캔들 수
    pub candle_limit: usize,
    /// 이벤트 브로드캐스트 채널 용량
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 180,
            symbols: vec!["BTC/USDT".to_string()],
            timeframes: vec![
                "15m".to_string(),
                "1h".to_string(),
                "4h".to_string(),
                "1d".to_string(),
                "1w".to_string(),
            ],
            candle_limit: 300,
            event_capacity: 64,
        }
    }
}

impl SchedulerConfig {
    /// 설정된 타임프레임 문자열을 파싱합니다.
    pub fn parsed_timeframes(&self) -> SignalResult<Vec<Timeframe>> {
        self.timeframes
            .iter()
            .map(|s| s.parse::<Timeframe>().map_err(SignalError::Config))
            .collect()
    }

    /// 설정된 심볼 문자열을 파싱합니다.
    pub fn parsed_symbols(&self) -> SignalResult<Vec<Symbol>> {
        self.symbols
            .iter()
            .map(|s| s.parse::<Symbol>().map_err(SignalError::Config))
            .collect()
    }
}

/// 분류별 투표 가중치.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub trend: Decimal,
    pub momentum: Decimal,
    pub pattern: Decimal,
    pub volatility: Decimal,
    pub volume: Decimal,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            trend: dec!(3.0),
            momentum: dec!(2.0),
            pattern: dec!(1.5),
            volatility: dec!(1.0),
            volume: dec!(1.0),
        }
    }
}

/// 신호 생성기 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 핵심 지표 계산에 필요한 최소 캔들 수
    pub min_candles: usize,
    /// 마지막 캔들 종료 후 허용하는 캔들 수 (초과 시 오래된 데이터)
    pub stale_after_candles: u32,
    /// LONG/SHORT 판정 임계값 (순 투표 비율)
    pub direction_threshold: Decimal,
    /// 분류별 가중치
    pub weights: CategoryWeights,
    /// 강한 추세로 판단하는 ADX 기준
    pub strong_trend_adx: Decimal,
    /// 강한 추세일 때 손절 ATR 배수
    pub wide_stop_atr: Decimal,
    /// 강한 추세일 때 목표 ATR 배수
    pub wide_target_atr: Decimal,
    /// 일반 손절 ATR 배수
    pub tight_stop_atr: Decimal,
    /// 일반 목표 ATR 배수
    pub tight_target_atr: Decimal,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_candles: 50,
            stale_after_candles: 3,
            direction_threshold: dec!(0.15),
            weights: CategoryWeights::default(),
            strong_trend_adx: dec!(25),
            wide_stop_atr: dec!(2.0),
            wide_target_atr: dec!(3.0),
            tight_stop_atr: dec!(1.2),
            tight_target_atr: dec!(1.8),
        }
    }
}

/// 타임프레임 정렬 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// 가중치 1 차이당 신뢰도 페널티
    pub penalty_per_weight: Decimal,
    /// 이 값 미만이면 NEUTRAL로 강등
    pub demotion_floor: Decimal,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            penalty_per_weight: dec!(5),
            demotion_floor: dec!(35),
        }
    }
}

/// 정확도 추적 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccuracyConfig {
    /// 대기 중 기록이 만료되기까지의 캔들 수
    pub max_pending_candles: u32,
    /// 적중률 계산에 사용할 최근 확정 기록 수
    pub rolling_window: usize,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            max_pending_candles: 48,
            rolling_window: 50,
        }
    }
}

/// 거래 추천 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// 최대 레버리지 (절대 상한 20배로 제한)
    pub max_leverage: u32,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { max_leverage: 10 }
    }
}

impl RecommendationConfig {
    /// 절대 상한이 적용된 최대 레버리지.
    pub fn effective_max_leverage(&self) -> u32 {
        self.max_leverage.clamp(1, HARD_MAX_LEVERAGE)
    }
}

/// 시장 데이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV 캔들 파일 디렉토리
    pub csv_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_dir: "./data".to_string(),
        }
    }
}

impl EngineConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> SignalResult<Self> {
        let builder = config::Config::builder()
            .set_default("scheduler.interval_secs", 180)?
            .set_default("generator.min_candles", 50)?
            // 파일이 없으면 기본값 사용
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SIGNAL")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> SignalResult<Self> {
        Self::load("config/default.toml")
    }

    /// 값의 범위를 검사합니다.
    pub fn validate(&self) -> SignalResult<()> {
        if self.scheduler.interval_secs == 0 {
            return Err(SignalError::Config(
                "scheduler.interval_secs는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.generator.min_candles < MIN_CORE_CANDLES {
            return Err(SignalError::Config(format!(
                "generator.min_candles는 {} 이상이어야 합니다",
                MIN_CORE_CANDLES
            )));
        }
        if self.generator.direction_threshold <= Decimal::ZERO
            || self.generator.direction_threshold >= Decimal::ONE
        {
            return Err(SignalError::Config(
                "generator.direction_threshold는 (0, 1) 범위여야 합니다".to_string(),
            ));
        }
        let atr_multipliers = [
            ("generator.wide_stop_atr", self.generator.wide_stop_atr),
            ("generator.wide_target_atr", self.generator.wide_target_atr),
            ("generator.tight_stop_atr", self.generator.tight_stop_atr),
            ("generator.tight_target_atr", self.generator.tight_target_atr),
        ];
        for (name, value) in atr_multipliers {
            if value <= Decimal::ZERO {
                return Err(SignalError::Config(format!(
                    "{}는 0보다 커야 합니다: {}",
                    name, value
                )));
            }
        }
        let candle_spans = [
            ("generator.stale_after_candles", self.generator.stale_after_candles),
            ("accuracy.max_pending_candles", self.accuracy.max_pending_candles),
        ];
        for (name, value) in candle_spans {
            if !(1..=MAX_CANDLE_SPAN).contains(&value) {
                return Err(SignalError::Config(format!(
                    "{}는 1 ~ {} 범위여야 합니다: {}",
                    name, MAX_CANDLE_SPAN, value
                )));
            }
        }
        if self.accuracy.rolling_window == 0 {
            return Err(SignalError::Config(
                "accuracy.rolling_window는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.alignment.penalty_per_weight < Decimal::ZERO {
            return Err(SignalError::Config(
                "alignment.penalty_per_weight는 음수일 수 없습니다".to_string(),
            ));
        }
        if self.alignment.demotion_floor < Decimal::ZERO
            || self.alignment.demotion_floor > Decimal::ONE_HUNDRED
        {
            return Err(SignalError::Config(
                "alignment.demotion_floor는 0 ~ 100 범위여야 합니다".to_string(),
            ));
        }
        self.scheduler.parsed_timeframes()?;
        self.scheduler.parsed_symbols()?;
        Ok(())
    }
}

/// 캔들 수로 지정하는 기간 설정의 상한.
pub const MAX_CANDLE_SPAN: u32 = 10_000;

/// 핵심 지표 묶음이 요구하는 최소 캔들 수.
///
/// MACD(12, 26, 9)의 34개와 EMA(50)의 50개 중 큰 값.
pub const MIN_CORE_CANDLES: usize = 50;
