//! 시장 데이터 제공자.
//!
//! 엔진은 캔들과 현재가를 이 trait을 통해서만 조회합니다.
//! - [`CsvMarketData`]: 디렉토리의 CSV 캔들 파일
//! - [`InMemoryMarketData`]: 테스트 및 재생용 메모리 저장소

mod csv_dir;
mod memory;

pub use csv_dir::{parse_candles, parse_open_time, CsvMarketData};
pub use memory::InMemoryMarketData;

use async_trait::async_trait;
use rust_decimal::Decimal;
use signal_core::{CandleSeries, Symbol, Timeframe};

use crate::error::ProviderError;

/// 시장 데이터 제공자 trait.
///
/// # 구현 예시
///
/// ```ignore
/// #[async_trait]
/// impl MarketDataProvider for ExchangeFeed {
///     async fn fetch_candles(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize)
///         -> Result<CandleSeries, ProviderError> {
///         // 거래소 kline 조회 및 변환
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 최근 캔들을 시간순으로 조회합니다.
    ///
    /// 최대 `limit`개의 가장 최근 캔들을 반환합니다. 진행 중인 캔들이
    /// 포함될 수 있으며 신호 생성 단계에서 제외됩니다.
    ///
    /// # Errors
    ///
    /// - `ProviderError::NotFound`: 심볼/타임프레임 데이터 없음
    /// - `ProviderError::Parse`: 원본 데이터 형식 오류
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, ProviderError>;

    /// 현재가 조회.
    async fn current_price(&self, symbol: &Symbol) -> Result<Decimal, ProviderError>;
}
