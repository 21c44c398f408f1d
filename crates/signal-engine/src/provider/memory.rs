//! 메모리 시장 데이터.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use signal_core::{Candle, CandleSeries, Symbol, Timeframe};
use tokio::sync::RwLock;

use super::MarketDataProvider;
use crate::error::ProviderError;

/// 메모리에 보관한 캔들과 현재가를 돌려주는 제공자.
///
/// 조회 지연(`with_latency`)을 설정하면 사이클이 진행 중인 상태를
/// 재현할 수 있습니다.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    candles: RwLock<HashMap<(Symbol, Timeframe), Vec<Candle>>>,
    prices: RwLock<HashMap<Symbol, Decimal>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 조회에 지연을 추가합니다.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// 캔들 시계열을 저장합니다 (기존 값 교체).
    pub async fn set_candles(&self, symbol: &Symbol, timeframe: Timeframe, candles: Vec<Candle>) {
        self.candles
            .write()
            .await
            .insert((symbol.clone(), timeframe), candles);
    }

    pub async fn set_price(&self, symbol: &Symbol, price: Decimal) {
        self.prices.write().await.insert(symbol.clone(), price);
    }

    /// 지금까지의 캔들 조회 횟수.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryMarketData {
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, ProviderError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.wait().await;

        let guard = self.candles.read().await;
        let candles = guard
            .get(&(symbol.clone(), timeframe))
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", symbol, timeframe)))?;
        let start = candles.len().saturating_sub(limit);
        Ok(CandleSeries::new(
            symbol.clone(),
            timeframe,
            candles[start..].to_vec(),
        ))
    }

    /// 저장된 현재가, 없으면 가장 짧은 타임프레임의 마지막 종가.
    async fn current_price(&self, symbol: &Symbol) -> Result<Decimal, ProviderError> {
        if let Some(price) = self.prices.read().await.get(symbol) {
            return Ok(*price);
        }
        let guard = self.candles.read().await;
        Timeframe::ALL
            .iter()
            .find_map(|tf| guard.get(&(symbol.clone(), *tf)).and_then(|c| c.last()))
            .map(|candle| candle.close)
            .ok_or_else(|| ProviderError::NotFound(format!("{} 현재가", symbol)))
    }
}
