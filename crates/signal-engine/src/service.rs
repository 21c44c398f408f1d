//! 신호 서비스.
//!
//! 화면 계층이 사용하는 단일 진입점입니다.
//! - 조회: [`SignalService::aligned_signal_set`], [`SignalService::trade_recommendation`],
//!   [`SignalService::accuracy`]
//! - 이벤트: [`SignalService::subscribe`]
//! - 제어: [`SignalService::trigger`], [`SignalService::switch_symbol`], [`SignalService::run`]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use signal_analytics::RecommendationBuilder;
use signal_core::{
    AccuracyMetric, AlignedSignalSet, EngineConfig, Symbol, Timeframe, TradeRecommendation,
};
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::EngineResult;
use crate::events::{SignalEvent, Trigger};
use crate::provider::MarketDataProvider;
use crate::scheduler::{CycleOutcome, CycleRunner};
use crate::state::{SharedState, SymbolState};

/// 다중 타임프레임 신호 서비스.
pub struct SignalService {
    config: EngineConfig,
    runner: CycleRunner,
    recommender: RecommendationBuilder,
    states: RwLock<HashMap<Symbol, SharedState>>,
    active: RwLock<Option<Symbol>>,
    events: broadcast::Sender<SignalEvent>,
}

impl SignalService {
    /// 새 서비스 인스턴스 생성.
    ///
    /// 설정의 첫 번째 심볼이 활성 심볼이 됩니다.
    ///
    /// # Arguments
    ///
    /// * `config` - 엔진 설정
    /// * `provider` - 시장 데이터 제공자
    pub fn new(config: EngineConfig, provider: Arc<dyn MarketDataProvider>) -> EngineResult<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.scheduler.event_capacity.max(1));
        let runner = CycleRunner::new(&config, provider, events.clone())?;
        let active = config.scheduler.parsed_symbols()?.into_iter().next();

        Ok(Self {
            recommender: RecommendationBuilder::new(config.recommendation.clone()),
            config,
            runner,
            states: RwLock::new(HashMap::new()),
            active: RwLock::new(active),
            events,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 계산 대상 타임프레임.
    pub fn timeframes(&self) -> &[Timeframe] {
        self.runner.timeframes()
    }

    /// 심볼 상태를 가져오거나 새로 만듭니다.
    async fn state(&self, symbol: &Symbol) -> SharedState {
        if let Some(state) = self.states.read().await.get(symbol) {
            return state.clone();
        }
        let mut states = self.states.write().await;
        states
            .entry(symbol.clone())
            .or_insert_with(|| {
                Arc::new(SymbolState::new(
                    symbol.clone(),
                    self.runner.timeframes(),
                    &self.config.accuracy,
                    Utc::now(),
                ))
            })
            .clone()
    }

    async fn existing_state(&self, symbol: &Symbol) -> Option<SharedState> {
        self.states.read().await.get(symbol).cloned()
    }

    /// 최신 정렬 신호 집합.
    ///
    /// 첫 사이클 전에는 모든 타임프레임이 `NoData(NotComputed)`입니다.
    pub async fn aligned_signal_set(&self, symbol: &Symbol) -> Arc<AlignedSignalSet> {
        match self.existing_state(symbol).await {
            Some(state) => state.latest().await,
            None => Arc::new(AlignedSignalSet::not_computed(
                symbol.clone(),
                self.runner.timeframes(),
                Utc::now(),
            )),
        }
    }

    /// 거래 추천.
    ///
    /// `timeframe`을 지정하지 않으면 방향성 신호 중 가장 상위 타임프레임을 사용합니다.
    pub async fn trade_recommendation(
        &self,
        symbol: &Symbol,
        timeframe: Option<Timeframe>,
    ) -> Option<TradeRecommendation> {
        let set = self.aligned_signal_set(symbol).await;
        self.recommender.build(&set, timeframe, Utc::now())
    }

    /// 타임프레임별 예측 적중률.
    pub async fn accuracy(&self, symbol: &Symbol, timeframe: Timeframe) -> AccuracyMetric {
        match self.existing_state(symbol).await {
            Some(state) => state.accuracy().lock().await.metric(timeframe),
            None => AccuracyMetric::NoData,
        }
    }

    /// 이벤트 구독.
    pub fn subscribe(&self) -> broadcast::Receiver<SignalEvent> {
        self.events.subscribe()
    }

    /// 현재 활성 심볼.
    pub async fn active_symbol(&self) -> Option<Symbol> {
        self.active.read().await.clone()
    }

    /// 심볼 하나의 사이클을 실행합니다.
    pub async fn trigger(&self, symbol: &Symbol, trigger: Trigger) -> EngineResult<CycleOutcome> {
        let state = self.state(symbol).await;
        self.runner.run(&state, trigger).await
    }

    /// 활성 심볼을 바꿉니다.
    ///
    /// 이전 심볼에서 진행 중인 사이클은 취소되어 결과가 버려집니다.
    ///
    /// # 반환
    /// 이전 활성 심볼
    pub async fn switch_symbol(&self, symbol: Symbol) -> Option<Symbol> {
        let mut active = self.active.write().await;
        if active.as_ref() == Some(&symbol) {
            return active.clone();
        }
        let previous = active.replace(symbol.clone());
        if let Some(previous) = &previous {
            if let Some(state) = self.existing_state(previous).await {
                state.cancel_in_flight().await;
            }
        }
        info!(from = ?previous.as_ref().map(ToString::to_string), to = %symbol, "활성 심볼 전환");
        previous
    }

    /// 백그라운드 루프.
    ///
    /// 주기마다 활성 심볼의 백그라운드 사이클을 별도 태스크로 실행합니다.
    /// 이전 사이클이 아직 실행 중이면 그 트리거는 건너뜁니다.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let period = Duration::from_secs(self.config.scheduler.interval_secs);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = period.as_secs(), "신호 스케줄러 시작");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("종료 신호 수신, 스케줄러 종료 중...");
                    break;
                }
                _ = ticker.tick() => {
                    let Some(symbol) = self.active_symbol().await else {
                        continue;
                    };
                    let service = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = service.trigger(&symbol, Trigger::Background).await {
                            error!(symbol = %symbol, error = %e, "백그라운드 사이클 실패");
                        }
                    });
                }
            }
        }
    }
}
