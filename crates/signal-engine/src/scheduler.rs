//! 재계산 사이클 실행.
//!
//! 한 사이클은 다음 순서로 진행됩니다:
//! 1. 심볼의 사이클 잠금 획득 (백그라운드는 실패 시 건너뜀, 수동은 대기)
//! 2. 타임프레임별 캔들 조회와 신호 생성을 동시에 실행
//! 3. 모두 끝난 뒤 계층 정렬
//! 4. 취소되지 않았으면 결과를 통째로 커밋하고 정확도 기록 갱신
//!
//! 취소 토큰은 잠금을 기다리기 전에 잡아 둡니다. 대기 중에 심볼이 전환되면
//! 그 사이클도 버려집니다.
//!
//! 타임프레임 하나의 실패는 해당 항목의 `NoData`로만 남고 나머지는 계속됩니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use signal_analytics::{HierarchyAligner, SeriesWindow, SignalGenerator, TimeframeOutcome};
use signal_core::{AlignedSignalSet, Candle, EngineConfig, NoDataReason, Symbol, Timeframe};
use tokio::sync::broadcast;
use tracing::{debug, info, warn, Instrument};

use crate::error::{EngineError, EngineResult, ProviderError};
use crate::events::{changed_timeframes, SignalEvent, Trigger};
use crate::provider::MarketDataProvider;
use crate::state::SymbolState;

/// 사이클 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 결과 커밋됨
    Committed {
        cycle: u64,
        /// 의미 있게 바뀐 타임프레임
        changed: Vec<Timeframe>,
    },
    /// 다른 사이클이 실행 중이어서 건너뜀
    Skipped,
    /// 취소되어 결과를 버림
    Discarded,
}

impl CycleOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CycleOutcome::Committed { .. })
    }
}

/// 타임프레임 하나의 계산 결과.
struct TimeframeRun {
    timeframe: Timeframe,
    outcome: TimeframeOutcome,
    /// 정확도 판정에 쓸 완성 캔들
    completed: Vec<Candle>,
}

/// 사이클 실행기.
pub struct CycleRunner {
    provider: Arc<dyn MarketDataProvider>,
    generator: SignalGenerator,
    aligner: HierarchyAligner,
    timeframes: Vec<Timeframe>,
    candle_limit: usize,
    events: broadcast::Sender<SignalEvent>,
}

impl CycleRunner {
    /// 설정으로 실행기를 생성합니다.
    ///
    /// # 오류
    /// 타임프레임 목록이 비었거나 해석할 수 없으면 `EngineError::Config`
    pub fn new(
        config: &EngineConfig,
        provider: Arc<dyn MarketDataProvider>,
        events: broadcast::Sender<SignalEvent>,
    ) -> EngineResult<Self> {
        let timeframes = config.scheduler.parsed_timeframes()?;
        if timeframes.is_empty() {
            return Err(EngineError::Config(
                "scheduler.timeframes가 비어 있습니다".to_string(),
            ));
        }
        let generator = SignalGenerator::new(config.generator.clone());
        // 지표 계산에 필요한 캔들보다 적게 요청하면 모든 타임프레임이 NoData
        let candle_limit = config.scheduler.candle_limit.max(generator.required_candles() + 1);

        Ok(Self {
            provider,
            generator,
            aligner: HierarchyAligner::new(config.alignment.clone()),
            timeframes,
            candle_limit,
            events,
        })
    }

    /// 계산 대상 타임프레임.
    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    /// 한 심볼의 사이클을 실행합니다.
    pub async fn run(&self, state: &SymbolState, trigger: Trigger) -> EngineResult<CycleOutcome> {
        let symbol = state.symbol().clone();
        let token = state.token().await;

        let _guard = match trigger {
            Trigger::Background => match state.try_begin_cycle() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!(symbol = %symbol, "사이클 실행 중, 백그라운드 트리거 건너뜀");
                    self.emit(SignalEvent::CycleSkipped {
                        symbol,
                        trigger,
                    });
                    return Ok(CycleOutcome::Skipped);
                }
            },
            Trigger::Manual => state.begin_cycle().await,
        };
        if token.is_cancelled() {
            return Ok(self.discard(symbol));
        }

        let now = Utc::now();
        let span = signal_core::signal_span!("signal_cycle", symbol);

        let (price, runs) = tokio::select! {
            computed = self.compute(&symbol, now).instrument(span) => computed,
            _ = token.cancelled() => return Ok(self.discard(symbol.clone())),
        };
        if token.is_cancelled() {
            return Ok(self.discard(symbol));
        }

        let cycle = state.cycle_count() + 1;
        let results: BTreeMap<Timeframe, TimeframeOutcome> = runs
            .iter()
            .map(|run| (run.timeframe, run.outcome.clone()))
            .collect();
        let set = Arc::new(
            self.aligner
                .align(&symbol, cycle, now, &self.timeframes, &results),
        );

        let previous = state.commit(set.clone(), now).await;
        self.update_accuracy(state, price, &runs, &set, now).await;

        let changed = changed_timeframes(&previous, &set);
        info!(
            symbol = %symbol,
            cycle,
            trigger = %trigger,
            anchor = %set.anchor,
            changed = changed.len(),
            "사이클 커밋"
        );
        if !changed.is_empty() {
            self.emit(SignalEvent::AlignedSetChanged {
                symbol,
                cycle,
                changed: changed.clone(),
            });
        }

        Ok(CycleOutcome::Committed { cycle, changed })
    }

    /// 모든 타임프레임을 동시에 계산합니다.
    ///
    /// # 반환
    /// 조회된 현재가 (실패 시 `None`)와 타임프레임별 결과
    async fn compute(
        &self,
        symbol: &Symbol,
        now: DateTime<Utc>,
    ) -> (Option<Decimal>, Vec<TimeframeRun>) {
        let price = self.provider.current_price(symbol).await;
        if let Err(e) = &price {
            warn!(symbol = %symbol, error = %e, "현재가 조회 실패");
        }

        let tasks = self.timeframes.iter().map(|timeframe| {
            let span = signal_core::signal_span!("timeframe_signal", symbol, timeframe);
            self.compute_timeframe(symbol, *timeframe, &price, now)
                .instrument(span)
        });
        let runs = join_all(tasks).await;
        (price.ok(), runs)
    }

    async fn compute_timeframe(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        price: &Result<Decimal, ProviderError>,
        now: DateTime<Utc>,
    ) -> TimeframeRun {
        let series = match self
            .provider
            .fetch_candles(symbol, timeframe, self.candle_limit)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(error = %e, "캔들 조회 실패");
                return TimeframeRun {
                    timeframe,
                    outcome: Err(NoDataReason::MissingInput {
                        detail: e.to_string(),
                    }),
                    completed: Vec::new(),
                };
            }
        };

        let completed = SeriesWindow::completed_candles(&series.candles, timeframe, now).to_vec();
        let outcome = match price {
            Ok(price) => self
                .generator
                .generate(&series, *price, now)
                .map_err(|e| {
                    if e.is_transient() {
                        debug!(error = %e, "신호 없음, 다음 사이클에서 재시도");
                    } else {
                        warn!(error = %e, "신호 계산 실패");
                    }
                    NoDataReason::from(&e)
                }),
            Err(e) => Err(NoDataReason::MissingInput {
                detail: format!("현재가: {}", e),
            }),
        };

        TimeframeRun {
            timeframe,
            outcome,
            completed,
        }
    }

    /// 새 캔들과 현재가로 대기 기록을 판정하고, 만료 처리 후 이번 신호를 등록합니다.
    async fn update_accuracy(
        &self,
        state: &SymbolState,
        price: Option<Decimal>,
        runs: &[TimeframeRun],
        set: &AlignedSignalSet,
        now: DateTime<Utc>,
    ) {
        let mut tracker = state.accuracy().lock().await;
        let mut resolved = 0;
        for run in runs {
            for candle in &run.completed {
                resolved += tracker.observe_candle(run.timeframe, candle);
            }
            if let Some(price) = price {
                resolved += tracker.observe_price(run.timeframe, price, now);
            }
        }
        let expired = tracker.expire(now);
        let registered = set
            .directional_signals()
            .filter(|signal| tracker.register(signal))
            .count();
        debug!(
            symbol = %state.symbol(),
            resolved,
            expired,
            registered,
            pending = tracker.pending_count(),
            "정확도 기록 갱신"
        );
    }

    fn discard(&self, symbol: Symbol) -> CycleOutcome {
        info!(symbol = %symbol, "취소된 사이클 결과 폐기");
        self.emit(SignalEvent::CycleDiscarded { symbol });
        CycleOutcome::Discarded
    }

    /// 구독자가 없으면 이벤트는 버려집니다.
    fn emit(&self, event: SignalEvent) {
        let _ = self.events.send(event);
    }
}
