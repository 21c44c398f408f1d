//! 신호 변경 이벤트.
//!
//! 구독자는 `SignalService::subscribe()`로 받은 broadcast 수신기로
//! 이벤트를 받습니다. `AlignedSetChanged`는 어떤 타임프레임의 방향,
//! 신뢰도 구간 또는 신호 유무가 바뀐 경우에만 발행됩니다.

use serde::{Deserialize, Serialize};
use signal_core::{AlignedSignalSet, Symbol, Timeframe};
use std::fmt;

/// 사이클 실행 계기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// 주기 타이머. 실행 중인 사이클이 있으면 버려집니다.
    Background,
    /// 사용자 요청. 실행 중인 사이클이 끝날 때까지 대기합니다.
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Background => write!(f, "background"),
            Trigger::Manual => write!(f, "manual"),
        }
    }
}

/// 서비스 이벤트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalEvent {
    /// 정렬된 신호 집합이 의미 있게 바뀜
    AlignedSetChanged {
        symbol: Symbol,
        cycle: u64,
        /// 바뀐 타임프레임 (가중치 오름차순)
        changed: Vec<Timeframe>,
    },
    /// 실행 중인 사이클 때문에 건너뛴 트리거
    CycleSkipped { symbol: Symbol, trigger: Trigger },
    /// 심볼 전환으로 결과를 버린 사이클
    CycleDiscarded { symbol: Symbol },
}

impl SignalEvent {
    pub fn symbol(&self) -> &Symbol {
        match self {
            SignalEvent::AlignedSetChanged { symbol, .. }
            | SignalEvent::CycleSkipped { symbol, .. }
            | SignalEvent::CycleDiscarded { symbol } => symbol,
        }
    }
}

/// 두 집합 사이에서 의미 있게 바뀐 타임프레임.
///
/// 방향, 신뢰도 구간, 신호 유무 중 하나라도 다르면 변경으로 봅니다.
/// 한쪽에만 있는 타임프레임도 포함됩니다.
pub fn changed_timeframes(previous: &AlignedSignalSet, next: &AlignedSignalSet) -> Vec<Timeframe> {
    let mut timeframes: Vec<Timeframe> = previous.timeframes().chain(next.timeframes()).collect();
    timeframes.sort();
    timeframes.dedup();

    timeframes
        .into_iter()
        .filter(|tf| {
            let before = previous.get(*tf);
            let after = next.get(*tf);
            match (before, after) {
                (Some(b), Some(a)) => b.fingerprint() != a.fingerprint(),
                _ => true,
            }
        })
        .collect()
}
