//! 예측 정확도 기록.
//!
//! 방향성 신호가 나올 때마다 대기 중 기록이 추가되고,
//! 이후 가격 관측으로 목표가/손절가 도달 여부가 확정됩니다.
//! 기록은 삭제되지 않으며 결과 필드만 한 번 채워집니다.

use crate::domain::signal::{Direction, TimeframeSignal};
use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 예측 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Correct,
    Incorrect,
}

/// 결과가 확정된 경로.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    TargetHit,
    StopHit,
    Expired,
}

/// 하나의 예측 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    /// (심볼, 타임프레임, 예측 시각)에서 결정되는 ID
    pub id: Uuid,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub predicted_direction: Direction,
    pub predicted_at: DateTime<Utc>,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub expires_at: DateTime<Utc>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl AccuracyRecord {
    /// 방향성 신호에서 대기 중 기록을 생성합니다.
    ///
    /// NEUTRAL 신호이거나 손절/목표가가 없거나 만료 시각을 표현할 수 없으면
    /// `None`을 반환합니다.
    ///
    /// # 인자
    /// * `signal` - 기록할 신호
    /// * `max_pending_candles` - 만료까지 허용할 캔들 수
    pub fn from_signal(signal: &TimeframeSignal, max_pending_candles: u32) -> Option<Self> {
        if !signal.is_directional() {
            return None;
        }
        let stop_loss = signal.stop_loss?;
        let take_profit = signal.take_profit?;
        let expires_at = signal
            .timestamp
            .checked_add_signed(signal.timeframe.span(max_pending_candles)?)?;

        Some(Self {
            id: Self::record_id(&signal.symbol, signal.timeframe, signal.timestamp),
            symbol: signal.symbol.clone(),
            timeframe: signal.timeframe,
            predicted_direction: signal.direction,
            predicted_at: signal.timestamp,
            entry_price: signal.entry_price,
            stop_loss,
            take_profit,
            expires_at,
            outcome: Outcome::Pending,
            resolved_at: None,
            resolution: None,
        })
    }

    /// 결정적 기록 ID (UUID v5).
    pub fn record_id(symbol: &Symbol, timeframe: Timeframe, predicted_at: DateTime<Utc>) -> Uuid {
        let key = format!(
            "{}:{}:{}",
            symbol,
            timeframe,
            predicted_at.timestamp_millis()
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == Outcome::Pending
    }

    /// 결과를 확정합니다. 이미 확정된 기록은 변경하지 않습니다.
    pub fn resolve(&mut self, outcome: Outcome, resolution: Resolution, at: DateTime<Utc>) {
        if !self.is_pending() {
            return;
        }
        self.outcome = outcome;
        self.resolution = Some(resolution);
        self.resolved_at = Some(at);
    }
}

/// 누적 적중률.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccuracyMetric {
    /// 확정된 기록이 없음
    NoData,
    /// 최근 확정 기록 기준 적중률
    Measured {
        /// 적중률 (0 ~ 100)
        hit_rate: Decimal,
        resolved_count: usize,
        correct_count: usize,
    },
}

impl AccuracyMetric {
    pub fn hit_rate(&self) -> Option<Decimal> {
        match self {
            AccuracyMetric::NoData => None,
            AccuracyMetric::Measured { hit_rate, .. } => Some(*hit_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_id_is_deterministic() {
        let symbol = Symbol::new("BTC", "USDT");
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = AccuracyRecord::record_id(&symbol, Timeframe::H1, at);
        let b = AccuracyRecord::record_id(&symbol, Timeframe::H1, at);
        let c = AccuracyRecord::record_id(&symbol, Timeframe::H4, at);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
