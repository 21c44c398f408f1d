//! 심볼별 상태.
//!
//! 스케줄러가 소유하는 심볼 단위 레코드입니다. 심볼 사이에는 공유되는
//! 가변 상태가 없고, 정확도 기록도 심볼마다 따로 보호됩니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use signal_analytics::AccuracyTracker;
use signal_core::{AccuracyConfig, AlignedSignalSet, Symbol, Timeframe};
use tokio::sync::{Mutex, MutexGuard, RwLock, TryLockError};
use tokio_util::sync::CancellationToken;

/// 마지막으로 커밋된 사이클 결과.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub set: Arc<AlignedSignalSet>,
    /// 마지막 커밋 시각 (커밋 전이면 `None`)
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// 한 심볼의 상태.
#[derive(Debug)]
pub struct SymbolState {
    symbol: Symbol,
    snapshot: RwLock<Snapshot>,
    cycles: AtomicU64,
    accuracy: Mutex<AccuracyTracker>,
    cancel: RwLock<CancellationToken>,
    /// 심볼당 동시에 하나의 사이클만 실행
    cycle_lock: Mutex<()>,
}

impl SymbolState {
    /// 모든 타임프레임이 `NotComputed`인 초기 상태.
    pub fn new(
        symbol: Symbol,
        timeframes: &[Timeframe],
        accuracy: &AccuracyConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let initial = AlignedSignalSet::not_computed(symbol.clone(), timeframes, now);
        Self {
            accuracy: Mutex::new(AccuracyTracker::new(symbol.clone(), accuracy)),
            symbol,
            snapshot: RwLock::new(Snapshot {
                set: Arc::new(initial),
                last_cycle_at: None,
            }),
            cycles: AtomicU64::new(0),
            cancel: RwLock::new(CancellationToken::new()),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// 최신 정렬 집합.
    pub async fn latest(&self) -> Arc<AlignedSignalSet> {
        self.snapshot.read().await.set.clone()
    }

    /// 커밋된 사이클 수.
    pub fn cycle_count(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// 새 집합을 통째로 교체하고 이전 집합을 반환합니다.
    pub async fn commit(
        &self,
        set: Arc<AlignedSignalSet>,
        at: DateTime<Utc>,
    ) -> Arc<AlignedSignalSet> {
        let mut snapshot = self.snapshot.write().await;
        self.cycles.store(set.cycle, Ordering::Release);
        let previous = std::mem::replace(&mut snapshot.set, set);
        snapshot.last_cycle_at = Some(at);
        previous
    }

    pub fn accuracy(&self) -> &Mutex<AccuracyTracker> {
        &self.accuracy
    }

    /// 현재 사이클들이 공유하는 취소 토큰.
    pub async fn token(&self) -> CancellationToken {
        self.cancel.read().await.clone()
    }

    /// 진행 중인 사이클을 취소하고 이후 사이클용 새 토큰을 설치합니다.
    pub async fn cancel_in_flight(&self) {
        let mut token = self.cancel.write().await;
        token.cancel();
        *token = CancellationToken::new();
    }

    /// 사이클 잠금 획득을 시도합니다 (백그라운드 트리거).
    pub fn try_begin_cycle(&self) -> Result<MutexGuard<'_, ()>, TryLockError> {
        self.cycle_lock.try_lock()
    }

    /// 사이클 잠금을 기다립니다 (수동 트리거).
    pub async fn begin_cycle(&self) -> MutexGuard<'_, ()> {
        self.cycle_lock.lock().await
    }
}

/// 심볼별 상태 맵 항목.
pub type SharedState = Arc<SymbolState>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state() -> SymbolState {
        SymbolState::new(
            Symbol::new("BTC", "USDT"),
            &[Timeframe::H1, Timeframe::D1],
            &AccuracyConfig::default(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_initial_state_is_not_computed() {
        let state = state();
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.set.cycle, 0);
        assert!(snapshot.last_cycle_at.is_none());
        assert_eq!(snapshot.set.entries.len(), 2);
        assert_eq!(state.cycle_count(), 0);
    }

    #[tokio::test]
    async fn test_cycle_lock_is_exclusive() {
        let state = state();
        let guard = state.begin_cycle().await;
        assert!(state.try_begin_cycle().is_err());
        drop(guard);
        assert!(state.try_begin_cycle().is_ok());
    }

    #[tokio::test]
    async fn test_cancel_replaces_token() {
        let state = state();
        let before = state.token().await;
        state.cancel_in_flight().await;
        assert!(before.is_cancelled());
        assert!(!state.token().await.is_cancelled());
    }

    #[tokio::test]
    async fn test_commit_swaps_set() {
        let state = state();
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 3, 0).unwrap();
        let mut next = (*state.latest().await).clone();
        next.cycle = 1;
        let previous = state.commit(Arc::new(next), at).await;
        assert_eq!(previous.cycle, 0);
        assert_eq!(state.latest().await.cycle, 1);
        assert_eq!(state.cycle_count(), 1);
        assert_eq!(state.snapshot().await.last_cycle_at, Some(at));
    }
}
