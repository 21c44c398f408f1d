//! 타임프레임 계층 정렬 결과.
//!
//! 정렬 단계는 요청된 모든 타임프레임에 대해 정확히 하나의 항목을 만듭니다.
//! 신호를 계산하지 못한 타임프레임은 이유와 함께 `NoData`로 표시됩니다.

use crate::domain::signal::{ConfidenceBucket, Direction, TimeframeSignal};
use crate::error::SignalError;
use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 신호가 없는 이유.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoDataReason {
    /// 아직 사이클이 실행되지 않음
    NotComputed,
    /// 입력 데이터를 가져오지 못함
    MissingInput { detail: String },
    /// 캔들 수 부족
    InsufficientData { required: usize, provided: usize },
    /// 잘못된 캔들
    InvalidCandles { index: usize, reason: String },
    /// 손절 거리가 0이거나 반대편
    DegenerateRisk { entry: Decimal, stop: Decimal },
    /// 마지막 캔들이 너무 오래됨
    StaleData { last_candle: DateTime<Utc> },
    /// 잘못된 입력 또는 설정
    InvalidInput { detail: String },
}

impl From<&SignalError> for NoDataReason {
    fn from(err: &SignalError) -> Self {
        match err {
            SignalError::InsufficientData { required, provided } => {
                NoDataReason::InsufficientData {
                    required: *required,
                    provided: *provided,
                }
            }
            SignalError::InvalidCandle { index, reason } => NoDataReason::InvalidCandles {
                index: *index,
                reason: reason.clone(),
            },
            SignalError::DegenerateRisk { entry, stop } => NoDataReason::DegenerateRisk {
                entry: *entry,
                stop: *stop,
            },
            SignalError::StaleData { last_candle, .. } => NoDataReason::StaleData {
                last_candle: *last_candle,
            },
            SignalError::InvalidInput(detail) | SignalError::Config(detail) => {
                NoDataReason::InvalidInput {
                    detail: detail.clone(),
                }
            }
        }
    }
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::NotComputed => write!(f, "not computed yet"),
            NoDataReason::MissingInput { detail } => write!(f, "missing input: {}", detail),
            NoDataReason::InsufficientData { required, provided } => {
                write!(f, "insufficient data: {} of {} candles", provided, required)
            }
            NoDataReason::InvalidCandles { index, reason } => {
                write!(f, "invalid candle at {}: {}", index, reason)
            }
            NoDataReason::DegenerateRisk { entry, stop } => {
                write!(f, "degenerate risk: entry {} stop {}", entry, stop)
            }
            NoDataReason::StaleData { last_candle } => {
                write!(f, "stale data: last candle {}", last_candle)
            }
            NoDataReason::InvalidInput { detail } => write!(f, "invalid input: {}", detail),
        }
    }
}

/// 상위 추세와 충돌하여 적용된 조정 내역.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentAdjustment {
    /// 조정 전 방향
    pub original_direction: Direction,
    /// 조정 전 신뢰도
    pub original_confidence: Decimal,
    /// 기준 앵커와의 계층 가중치 차이
    pub weight_gap: u32,
    /// 차감된 신뢰도
    pub penalty: Decimal,
    /// NEUTRAL로 강등되었는지 여부
    pub demoted: bool,
}

/// 정렬된 단일 타임프레임 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlignedEntry {
    /// 계산된 신호 (조정이 있으면 함께 기록)
    Signal {
        signal: TimeframeSignal,
        #[serde(skip_serializing_if = "Option::is_none")]
        adjustment: Option<AlignmentAdjustment>,
    },
    /// 신호 없음
    NoData { reason: NoDataReason },
}

impl AlignedEntry {
    /// 조정 없는 신호 항목.
    pub fn signal(signal: TimeframeSignal) -> Self {
        AlignedEntry::Signal {
            signal,
            adjustment: None,
        }
    }

    pub fn no_data(reason: NoDataReason) -> Self {
        AlignedEntry::NoData { reason }
    }

    /// 신호가 있으면 반환합니다.
    pub fn as_signal(&self) -> Option<&TimeframeSignal> {
        match self {
            AlignedEntry::Signal { signal, .. } => Some(signal),
            AlignedEntry::NoData { .. } => None,
        }
    }

    pub fn adjustment(&self) -> Option<&AlignmentAdjustment> {
        match self {
            AlignedEntry::Signal { adjustment, .. } => adjustment.as_ref(),
            AlignedEntry::NoData { .. } => None,
        }
    }

    /// 변경 감지용 요약 (방향, 신뢰도 구간). 신호가 없으면 `None`.
    pub fn fingerprint(&self) -> Option<(Direction, ConfidenceBucket)> {
        self.as_signal()
            .map(|s| (s.direction, ConfidenceBucket::from_confidence(s.confidence)))
    }
}

/// 한 심볼의 정렬된 신호 집합.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSignalSet {
    pub symbol: Symbol,
    /// 사이클 번호 (0 = 아직 계산 전)
    pub cycle: u64,
    pub generated_at: DateTime<Utc>,
    /// 상위 두 방향성 타임프레임이 합의한 방향
    pub anchor: Direction,
    pub entries: BTreeMap<Timeframe, AlignedEntry>,
}

impl AlignedSignalSet {
    /// 모든 타임프레임이 `NotComputed`인 초기 집합.
    pub fn not_computed(symbol: Symbol, timeframes: &[Timeframe], now: DateTime<Utc>) -> Self {
        let entries = timeframes
            .iter()
            .map(|tf| (*tf, AlignedEntry::no_data(NoDataReason::NotComputed)))
            .collect();
        Self {
            symbol,
            cycle: 0,
            generated_at: now,
            anchor: Direction::Neutral,
            entries,
        }
    }

    pub fn get(&self, timeframe: Timeframe) -> Option<&AlignedEntry> {
        self.entries.get(&timeframe)
    }

    /// 해당 타임프레임의 신호.
    pub fn signal(&self, timeframe: Timeframe) -> Option<&TimeframeSignal> {
        self.get(timeframe).and_then(AlignedEntry::as_signal)
    }

    /// 포함된 타임프레임 (가중치 오름차순).
    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.entries.keys().copied()
    }

    /// LONG/SHORT 신호를 가중치 내림차순으로 반환합니다.
    pub fn directional_signals(&self) -> impl Iterator<Item = &TimeframeSignal> {
        self.entries
            .values()
            .rev()
            .filter_map(AlignedEntry::as_signal)
            .filter(|s| s.is_directional())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_not_computed_covers_every_timeframe() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let set = AlignedSignalSet::not_computed(
            Symbol::new("BTC", "USDT"),
            &[Timeframe::M15, Timeframe::H1, Timeframe::D1],
            now,
        );
        assert_eq!(set.entries.len(), 3);
        assert_eq!(
            set.get(Timeframe::H1),
            Some(&AlignedEntry::no_data(NoDataReason::NotComputed))
        );
        assert!(set.signal(Timeframe::D1).is_none());
        assert_eq!(set.anchor, Direction::Neutral);
    }

    #[test]
    fn test_no_data_reason_from_error() {
        let err = SignalError::InsufficientData {
            required: 50,
            provided: 12,
        };
        assert_eq!(
            NoDataReason::from(&err),
            NoDataReason::InsufficientData {
                required: 50,
                provided: 12
            }
        );
    }

    #[test]
    fn test_entries_serialize_with_interval_keys() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let set = AlignedSignalSet::not_computed(Symbol::new("ETH", "USDT"), &[Timeframe::H4], now);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["entries"]["4h"]["status"], "no_data");
        assert_eq!(json["entries"]["4h"]["reason"]["kind"], "not_computed");
    }
}
