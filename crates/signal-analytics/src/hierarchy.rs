//! 타임프레임 계층 정렬.
//!
//! 긴 타임프레임의 추세가 짧은 타임프레임의 역방향 신호보다 우선합니다.
//!
//! # 규칙
//!
//! 1. 요청된 타임프레임을 계층 가중치 내림차순으로 정렬
//! 2. 방향성 신호를 가진 상위 두 타임프레임이 같은 방향이면 그 방향이 앵커
//! 3. 앵커와 충돌하는 나머지 타임프레임은
//!    `penalty_per_weight × (하위 앵커 가중치 - 자신의 가중치)`만큼 신뢰도 차감,
//!    결과가 `demotion_floor` 미만이면 NEUTRAL로 강등
//! 4. 일치하는 신호, NEUTRAL 신호, 앵커 자신은 그대로 통과
//!
//! 상태가 없으므로 같은 입력에 대해 항상 같은 결과를 냅니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use signal_core::{
    AlignedEntry, AlignedSignalSet, AlignmentAdjustment, AlignmentConfig, Direction, NoDataReason,
    Symbol, Timeframe, TimeframeSignal,
};
use std::collections::BTreeMap;
use tracing::debug;

/// 타임프레임 하나의 계산 결과 (신호 또는 신호가 없는 이유).
pub type TimeframeOutcome = Result<TimeframeSignal, NoDataReason>;

/// 결정된 앵커.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub direction: Direction,
    /// 가중치가 높은 앵커
    pub upper: Timeframe,
    /// 가중치가 낮은 앵커 (페널티 기준)
    pub lower: Timeframe,
}

/// 계층 정렬기.
#[derive(Debug, Clone, Default)]
pub struct HierarchyAligner {
    config: AlignmentConfig,
}

impl HierarchyAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    /// 방향성 신호를 가진 상위 두 타임프레임이 합의한 앵커.
    ///
    /// 두 타임프레임이 없거나 방향이 다르면 `None`.
    pub fn anchor(
        &self,
        requested: &[Timeframe],
        results: &BTreeMap<Timeframe, TimeframeOutcome>,
    ) -> Option<Anchor> {
        let mut directional = Timeframe::sorted_by_weight_desc(requested)
            .into_iter()
            .filter_map(|tf| match results.get(&tf) {
                Some(Ok(signal)) if signal.is_directional() => Some((tf, signal.direction)),
                _ => None,
            });
        let (upper, upper_direction) = directional.next()?;
        let (lower, lower_direction) = directional.next()?;
        (upper_direction == lower_direction).then_some(Anchor {
            direction: upper_direction,
            upper,
            lower,
        })
    }

    /// 타임프레임별 결과를 정렬된 신호 집합으로 만듭니다.
    ///
    /// # 인자
    /// * `symbol` - 심볼
    /// * `cycle` - 사이클 번호
    /// * `now` - 생성 시각
    /// * `requested` - 요청된 타임프레임 (결과 집합은 이 목록을 정확히 덮음)
    /// * `results` - 타임프레임별 계산 결과 (누락은 `MissingInput`)
    pub fn align(
        &self,
        symbol: &Symbol,
        cycle: u64,
        now: DateTime<Utc>,
        requested: &[Timeframe],
        results: &BTreeMap<Timeframe, TimeframeOutcome>,
    ) -> AlignedSignalSet {
        let anchor = self.anchor(requested, results);
        let mut entries = BTreeMap::new();

        for timeframe in Timeframe::sorted_by_weight_desc(requested) {
            let entry = match results.get(&timeframe) {
                None => AlignedEntry::no_data(NoDataReason::MissingInput {
                    detail: format!("{} 결과 없음", timeframe),
                }),
                Some(Err(reason)) => AlignedEntry::no_data(reason.clone()),
                Some(Ok(signal)) => match anchor {
                    Some(anchor) => self.adjust(signal.clone(), anchor),
                    None => AlignedEntry::signal(signal.clone()),
                },
            };
            entries.insert(timeframe, entry);
        }

        AlignedSignalSet {
            symbol: symbol.clone(),
            cycle,
            generated_at: now,
            anchor: anchor.map_or(Direction::Neutral, |a| a.direction),
            entries,
        }
    }

    fn adjust(&self, mut signal: TimeframeSignal, anchor: Anchor) -> AlignedEntry {
        let timeframe = signal.timeframe;
        if timeframe == anchor.upper
            || timeframe == anchor.lower
            || !signal.direction.conflicts_with(anchor.direction)
        {
            return AlignedEntry::signal(signal);
        }

        let weight_gap = anchor
            .lower
            .hierarchy_weight()
            .saturating_sub(timeframe.hierarchy_weight());
        let penalty = self.config.penalty_per_weight * Decimal::from(weight_gap);
        let original_direction = signal.direction;
        let original_confidence = signal.confidence;

        signal.confidence = (signal.confidence - penalty).max(Decimal::ZERO);
        let demoted = signal.confidence < self.config.demotion_floor;
        if demoted {
            signal.demote_to_neutral();
        }

        debug!(
            symbol = %signal.symbol,
            timeframe = %timeframe,
            anchor = %anchor.direction,
            penalty = %penalty,
            confidence = %signal.confidence,
            demoted,
            "상위 추세와 충돌하는 신호 조정"
        );

        AlignedEntry::Signal {
            signal,
            adjustment: Some(AlignmentAdjustment {
                original_direction,
                original_confidence,
                weight_gap,
                penalty,
                demoted,
            }),
        }
    }
}
