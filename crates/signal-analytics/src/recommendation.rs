//! 거래 추천 생성.
//!
//! 정렬된 신호 집합에서 하나의 방향성 신호를 골라 진입가, 손절가,
//! 단계별 익절가, 레버리지, 근거를 묶습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_core::{
    AlignedEntry, AlignedSignalSet, AlignmentAdjustment, Direction, RecommendationConfig,
    Timeframe, TimeframeSignal, TradeRecommendation,
};
use tracing::debug;

use crate::signal_generator::risk_reward;

/// 목표 거리에 대한 익절 단계 배수.
pub const TAKE_PROFIT_STEPS: [Decimal; 3] = [dec!(0.8), dec!(1.0), dec!(1.2)];

/// 신뢰도 구간별 레버리지 (상한 미만 → 배수).
const LEVERAGE_STEPS: [(Decimal, u32); 4] = [
    (dec!(55), 1),
    (dec!(65), 2),
    (dec!(75), 3),
    (dec!(85), 5),
];
const TOP_LEVERAGE: u32 = 10;

/// 거래 추천 생성기.
#[derive(Debug, Clone, Default)]
pub struct RecommendationBuilder {
    config: RecommendationConfig,
}

impl RecommendationBuilder {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    /// 추천에 사용할 신호를 고릅니다.
    ///
    /// 타임프레임을 지정하면 그 타임프레임만 보고, 신호가 없거나 NEUTRAL이면 `None`.
    /// 지정하지 않으면 방향성 신호 중 가중치가 가장 높은 타임프레임을 고릅니다.
    pub fn select<'a>(
        &self,
        set: &'a AlignedSignalSet,
        timeframe: Option<Timeframe>,
    ) -> Option<&'a AlignedEntry> {
        match timeframe {
            Some(tf) => set
                .get(tf)
                .filter(|entry| entry.as_signal().is_some_and(TimeframeSignal::is_directional)),
            None => set
                .entries
                .values()
                .rev()
                .find(|entry| entry.as_signal().is_some_and(TimeframeSignal::is_directional)),
        }
    }

    /// 신뢰도에 따른 레버리지 (설정 상한 적용).
    pub fn leverage_for(&self, confidence: Decimal) -> u32 {
        let stepped = LEVERAGE_STEPS
            .iter()
            .find(|(upper, _)| confidence < *upper)
            .map_or(TOP_LEVERAGE, |(_, leverage)| *leverage);
        stepped.min(self.config.effective_max_leverage())
    }

    /// 정렬된 신호 집합에서 거래 추천을 만듭니다.
    ///
    /// # 반환
    /// 대상 신호가 없거나 손절 거리가 유효하지 않으면 `None`
    pub fn build(
        &self,
        set: &AlignedSignalSet,
        timeframe: Option<Timeframe>,
        now: DateTime<Utc>,
    ) -> Option<TradeRecommendation> {
        let entry = self.select(set, timeframe)?;
        let signal = entry.as_signal()?;
        let stop_loss = signal.stop_loss?;
        let target = signal.take_profit?;

        let risk_reward_ratio =
            match risk_reward(signal.direction, signal.entry_price, stop_loss, target) {
                Ok(ratio) => ratio.round_dp(2),
                Err(e) => {
                    debug!(
                        symbol = %set.symbol,
                        timeframe = %signal.timeframe,
                        error = %e,
                        "추천 생략"
                    );
                    return None;
                }
            };

        Some(TradeRecommendation {
            symbol: set.symbol.clone(),
            timeframe: signal.timeframe,
            direction: signal.direction,
            confidence: signal.confidence,
            entry: signal.entry_price,
            stop_loss,
            take_profits: take_profit_ladder(signal.entry_price, target),
            leverage: self.leverage_for(signal.confidence),
            risk_reward_ratio,
            rationale: rationale(signal, set.anchor, entry.adjustment()),
            generated_at: now,
        })
    }
}

/// 진입가에서 목표 거리의 0.8배, 1.0배, 1.2배 지점.
pub fn take_profit_ladder(entry: Decimal, target: Decimal) -> [Decimal; 3] {
    let distance = target - entry;
    TAKE_PROFIT_STEPS.map(|step| entry + distance * step)
}

/// 방향과 일치하는 근거만 모읍니다.
fn rationale(
    signal: &TimeframeSignal,
    anchor: Direction,
    adjustment: Option<&AlignmentAdjustment>,
) -> Vec<String> {
    let mut lines: Vec<String> = signal
        .agreeing_readings()
        .map(|reading| format!("{}: {}", reading.name, reading.detail))
        .collect();
    lines.extend(
        signal
            .matching_patterns()
            .map(|pattern| format!("{} (신뢰도 {})", pattern.name, pattern.reliability.round_dp(0))),
    );
    if anchor == signal.direction {
        lines.push(format!("상위 타임프레임 추세 {}와 일치", anchor));
    }
    if let Some(adjustment) = adjustment {
        lines.push(format!(
            "상위 추세와 충돌하여 신뢰도 {} 차감 ({} → {})",
            adjustment.penalty,
            adjustment.original_confidence,
            signal.confidence
        ));
    }
    lines
}
