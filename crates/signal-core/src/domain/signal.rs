//! 타임프레임별 트레이딩 신호.
//!
//! 이 모듈은 신호 생성기가 산출하는 타입을 정의합니다:
//! - `Direction` - 신호 방향 (LONG/SHORT/NEUTRAL)
//! - `IndicatorReading` - 개별 지표의 판독값과 투표
//! - `PatternFormation` - 감지된 캔들 패턴/다이버전스
//! - `TimeframeSignal` - 하나의 타임프레임에 대한 최종 신호

use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 신호 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// 매수 포지션
    Long,
    /// 매도 포지션
    Short,
    /// 관망
    Neutral,
}

impl Direction {
    /// LONG 또는 SHORT인지 확인합니다.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }

    /// 두 방향이 서로 반대인지 확인합니다 (NEUTRAL은 어느 쪽과도 충돌하지 않음).
    pub fn conflicts_with(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Long, Direction::Short) | (Direction::Short, Direction::Long)
        )
    }

    /// 이 방향과 일치하는 지표 투표.
    pub fn as_vote(&self) -> IndicatorVote {
        match self {
            Direction::Long => IndicatorVote::Buy,
            Direction::Short => IndicatorVote::Sell,
            Direction::Neutral => IndicatorVote::Neutral,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// 지표 분류. 방향 결정 시 분류별 가중치가 적용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Trend,
    Momentum,
    Volatility,
    Volume,
    Pattern,
}

impl IndicatorCategory {
    pub const ALL: [IndicatorCategory; 5] = [
        IndicatorCategory::Trend,
        IndicatorCategory::Momentum,
        IndicatorCategory::Volatility,
        IndicatorCategory::Volume,
        IndicatorCategory::Pattern,
    ];
}

impl fmt::Display for IndicatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorCategory::Trend => "trend",
            IndicatorCategory::Momentum => "momentum",
            IndicatorCategory::Volatility => "volatility",
            IndicatorCategory::Volume => "volume",
            IndicatorCategory::Pattern => "pattern",
        };
        write!(f, "{}", name)
    }
}

/// 개별 지표의 투표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorVote {
    Buy,
    Sell,
    Neutral,
}

impl IndicatorVote {
    /// 투표가 해당 방향과 같은 쪽인지 확인합니다.
    pub fn agrees_with(&self, direction: Direction) -> bool {
        direction.is_directional() && *self == direction.as_vote()
    }
}

/// 투표 강도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
}

/// 신뢰도 구간. 변경 이벤트의 기준이 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    /// 40 미만
    Low,
    /// 40 이상 60 미만
    Medium,
    /// 60 이상 80 미만
    High,
    /// 80 이상
    VeryHigh,
}

impl ConfidenceBucket {
    /// 신뢰도 값에서 구간을 결정합니다.
    pub fn from_confidence(confidence: Decimal) -> Self {
        if confidence < Decimal::from(40) {
            ConfidenceBucket::Low
        } else if confidence < Decimal::from(60) {
            ConfidenceBucket::Medium
        } else if confidence < Decimal::from(80) {
            ConfidenceBucket::High
        } else {
            ConfidenceBucket::VeryHigh
        }
    }
}

/// 하나의 지표 판독 결과.
///
/// 매 사이클마다 새로 계산되며 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    /// 지표 이름 (예: "RSI(14)")
    pub name: String,
    /// 분류
    pub category: IndicatorCategory,
    /// 대표 값
    pub value: Decimal,
    /// 투표
    pub vote: IndicatorVote,
    /// 투표 강도
    pub strength: SignalStrength,
    /// 사람이 읽을 수 있는 설명
    pub detail: String,
}

impl IndicatorReading {
    /// 새 판독값을 생성합니다.
    pub fn new(
        name: impl Into<String>,
        category: IndicatorCategory,
        value: Decimal,
        vote: IndicatorVote,
        strength: SignalStrength,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            value,
            vote,
            strength,
            detail: detail.into(),
        }
    }
}

/// 패턴의 방향성.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

impl PatternBias {
    /// 패턴 방향이 신호 방향과 일치하는지 확인합니다.
    pub fn matches(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (PatternBias::Bullish, Direction::Long) | (PatternBias::Bearish, Direction::Short)
        )
    }

    pub fn as_vote(&self) -> IndicatorVote {
        match self {
            PatternBias::Bullish => IndicatorVote::Buy,
            PatternBias::Bearish => IndicatorVote::Sell,
            PatternBias::Neutral => IndicatorVote::Neutral,
        }
    }
}

/// 감지 가능한 패턴 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    BullishEngulfing,
    BearishEngulfing,
    Doji,
    MorningStar,
    EveningStar,
    Hammer,
    InvertedHammer,
    HangingMan,
    ShootingStar,
    BullishRsiDivergence,
    BearishRsiDivergence,
    BullishMacdDivergence,
    BearishMacdDivergence,
}

impl PatternKind {
    /// 다이버전스 계열인지 확인합니다.
    pub fn is_divergence(&self) -> bool {
        matches!(
            self,
            PatternKind::BullishRsiDivergence
                | PatternKind::BearishRsiDivergence
                | PatternKind::BullishMacdDivergence
                | PatternKind::BearishMacdDivergence
        )
    }

    /// 패턴 고유의 방향성.
    pub fn bias(&self) -> PatternBias {
        match self {
            PatternKind::BullishEngulfing
            | PatternKind::MorningStar
            | PatternKind::Hammer
            | PatternKind::InvertedHammer
            | PatternKind::BullishRsiDivergence
            | PatternKind::BullishMacdDivergence => PatternBias::Bullish,
            PatternKind::BearishEngulfing
            | PatternKind::EveningStar
            | PatternKind::HangingMan
            | PatternKind::ShootingStar
            | PatternKind::BearishRsiDivergence
            | PatternKind::BearishMacdDivergence => PatternBias::Bearish,
            PatternKind::Doji => PatternBias::Neutral,
        }
    }

    /// 표시 이름.
    pub fn display_name(&self) -> &'static str {
        match self {
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::Doji => "Doji",
            PatternKind::MorningStar => "Morning Star",
            PatternKind::EveningStar => "Evening Star",
            PatternKind::Hammer => "Hammer",
            PatternKind::InvertedHammer => "Inverted Hammer",
            PatternKind::HangingMan => "Hanging Man",
            PatternKind::ShootingStar => "Shooting Star",
            PatternKind::BullishRsiDivergence => "Bullish RSI Divergence",
            PatternKind::BearishRsiDivergence => "Bearish RSI Divergence",
            PatternKind::BullishMacdDivergence => "Bullish MACD Divergence",
            PatternKind::BearishMacdDivergence => "Bearish MACD Divergence",
        }
    }
}

/// 감지된 패턴.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFormation {
    /// 표시 이름
    pub name: String,
    /// 패턴 종류
    pub kind: PatternKind,
    /// 방향성
    pub bias: PatternBias,
    /// 신뢰도 (0 ~ 100)
    pub reliability: Decimal,
    /// 예상 목표가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_price: Option<Decimal>,
    /// 패턴이 완성된 캔들 인덱스
    pub index: usize,
    /// 설명
    pub description: String,
}

impl PatternFormation {
    /// 새 패턴을 생성합니다. 신뢰도는 [0, 100]으로 제한됩니다.
    pub fn new(
        kind: PatternKind,
        reliability: Decimal,
        projected_price: Option<Decimal>,
        index: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: kind.display_name().to_string(),
            kind,
            bias: kind.bias(),
            reliability: reliability.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            projected_price,
            index,
            description: description.into(),
        }
    }
}

/// 하나의 타임프레임에 대한 신호.
///
/// 손절가/목표가/손익비는 방향이 LONG 또는 SHORT일 때만 존재합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSignal {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub direction: Direction,
    /// 신뢰도 (0 ~ 100)
    pub confidence: Decimal,
    pub entry_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<Decimal>,
    /// 손절/목표 산출에 사용된 ATR
    pub atr: Decimal,
    pub indicators: Vec<IndicatorReading>,
    pub patterns: Vec<PatternFormation>,
    /// 현재가 아래 지지선 (가까운 순)
    pub support_levels: Vec<Decimal>,
    /// 현재가 위 저항선 (가까운 순)
    pub resistance_levels: Vec<Decimal>,
    /// 신호 생성 시각
    pub timestamp: DateTime<Utc>,
    /// 마지막 완성 캔들의 시작 시간
    pub last_candle_time: DateTime<Utc>,
}

impl TimeframeSignal {
    /// LONG 또는 SHORT 신호인지 확인합니다.
    pub fn is_directional(&self) -> bool {
        self.direction.is_directional()
    }

    /// NEUTRAL로 강등합니다. 손절/목표/손익비를 제거합니다.
    pub fn demote_to_neutral(&mut self) {
        self.direction = Direction::Neutral;
        self.stop_loss = None;
        self.take_profit = None;
        self.risk_reward_ratio = None;
    }

    /// 방향과 일치하는 투표를 한 지표.
    pub fn agreeing_readings(&self) -> impl Iterator<Item = &IndicatorReading> {
        let direction = self.direction;
        self.indicators
            .iter()
            .filter(move |reading| reading.vote.agrees_with(direction))
    }

    /// 방향과 일치하는 패턴.
    pub fn matching_patterns(&self) -> impl Iterator<Item = &PatternFormation> {
        let direction = self.direction;
        self.patterns
            .iter()
            .filter(move |pattern| pattern.bias.matches(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_conflicts() {
        assert!(Direction::Long.conflicts_with(Direction::Short));
        assert!(Direction::Short.conflicts_with(Direction::Long));
        assert!(!Direction::Long.conflicts_with(Direction::Neutral));
        assert!(!Direction::Neutral.conflicts_with(Direction::Short));
        assert!(!Direction::Long.conflicts_with(Direction::Long));
    }

    #[test]
    fn test_vote_agreement() {
        assert!(IndicatorVote::Buy.agrees_with(Direction::Long));
        assert!(!IndicatorVote::Buy.agrees_with(Direction::Short));
        assert!(!IndicatorVote::Neutral.agrees_with(Direction::Neutral));
    }

    #[test]
    fn test_pattern_formation_clamps_reliability() {
        let pattern = PatternFormation::new(PatternKind::Hammer, dec!(140), None, 10, "test");
        assert_eq!(pattern.reliability, dec!(100));
        assert_eq!(pattern.bias, PatternBias::Bullish);
        assert_eq!(pattern.name, "Hammer");
    }

    #[test]
    fn test_confidence_bucket_boundaries() {
        assert_eq!(ConfidenceBucket::from_confidence(dec!(39.99)), ConfidenceBucket::Low);
        assert_eq!(ConfidenceBucket::from_confidence(dec!(40)), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::from_confidence(dec!(60)), ConfidenceBucket::High);
        assert_eq!(ConfidenceBucket::from_confidence(dec!(80)), ConfidenceBucket::VeryHigh);
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_json::to_string(&Direction::Long).unwrap(), "\"LONG\"");
        assert_eq!(
            serde_json::to_string(&IndicatorCategory::Momentum).unwrap(),
            "\"momentum\""
        );
    }
}
