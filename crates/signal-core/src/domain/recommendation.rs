//! 단일 거래 추천.

use crate::domain::signal::Direction;
use crate::types::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 하나의 타임프레임 신호에서 도출된 실행 가능한 추천.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecommendation {
    pub symbol: Symbol,
    /// 추천의 근거가 된 타임프레임
    pub timeframe: Timeframe,
    /// LONG 또는 SHORT
    pub direction: Direction,
    pub confidence: Decimal,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    /// 단계별 익절가 (목표 거리의 0.8배, 1.0배, 1.2배)
    pub take_profits: [Decimal; 3],
    /// 권장 레버리지 (배수)
    pub leverage: u32,
    pub risk_reward_ratio: Decimal,
    /// 추천 근거
    pub rationale: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl TradeRecommendation {
    /// 최종 익절가.
    pub fn final_target(&self) -> Decimal {
        self.take_profits[2]
    }
}
