//! CSV 디렉토리 시장 데이터.
//!
//! 파일 이름은 `{BASE}{QUOTE}_{interval}.csv` (예: `BTCUSDT_1h.csv`)이고
//! 헤더는 `open_time,open,high,low,close,volume`입니다.
//! `open_time`은 RFC 3339 문자열 또는 epoch 밀리초입니다.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use signal_core::{Candle, CandleSeries, Symbol, Timeframe};
use tracing::debug;

use super::MarketDataProvider;
use crate::error::ProviderError;

/// CSV 한 행. 숫자는 정밀도 유지를 위해 문자열로 받습니다.
#[derive(Debug, Deserialize)]
struct CandleRow {
    open_time: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

/// CSV 파일 디렉토리에서 캔들을 읽는 제공자.
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 심볼/타임프레임에 해당하는 파일 경로.
    pub fn file_path(&self, symbol: &Symbol, timeframe: Timeframe) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", symbol.to_compact(), timeframe.as_interval()))
    }

    async fn read_file(&self, symbol: &Symbol, timeframe: Timeframe) -> Result<Vec<Candle>, ProviderError> {
        let path = self.file_path(symbol, timeframe);
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ProviderError::NotFound(format!("{} ({})", path.display(), symbol))
            }
            _ => ProviderError::Io(format!("{}: {}", path.display(), e)),
        })?;
        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        parse_candles(&source_name, bytes.as_slice())
    }
}

#[async_trait]
impl MarketDataProvider for CsvMarketData {
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, ProviderError> {
        let mut candles = self.read_file(symbol, timeframe).await?;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        debug!(symbol = %symbol, timeframe = %timeframe, count = candles.len(), "CSV 캔들 로드");
        Ok(CandleSeries::new(symbol.clone(), timeframe, candles))
    }

    /// 가장 짧은 타임프레임 파일의 마지막 종가.
    async fn current_price(&self, symbol: &Symbol) -> Result<Decimal, ProviderError> {
        for timeframe in Timeframe::ALL {
            match self.read_file(symbol, timeframe).await {
                Ok(candles) => {
                    if let Some(last) = candles.last() {
                        return Ok(last.close);
                    }
                }
                Err(ProviderError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(ProviderError::NotFound(format!(
            "{}: 현재가를 구할 CSV 파일 없음",
            symbol
        )))
    }
}

/// CSV 본문을 캔들 목록으로 변환합니다.
///
/// # 오류
/// 행 단위 역직렬화 또는 시간 파싱 실패 시 `ProviderError::Parse`
pub fn parse_candles<R: std::io::Read>(
    source_name: &str,
    reader: R,
) -> Result<Vec<Candle>, ProviderError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();
    for result in reader.deserialize::<CandleRow>() {
        let row = result.map_err(|e| ProviderError::Parse {
            source_name: source_name.to_string(),
            line: e.position().map_or(0, |p| p.line()),
            detail: e.to_string(),
        })?;
        let line = candles.len() as u64 + 2;
        let parse_error = |detail: String| ProviderError::Parse {
            source_name: source_name.to_string(),
            line,
            detail,
        };
        let open_time = parse_open_time(&row.open_time)
            .ok_or_else(|| parse_error(format!("잘못된 시간: {}", row.open_time)))?;
        let number = |raw: &str| {
            Decimal::from_str(raw).map_err(|e| parse_error(format!("잘못된 숫자 {}: {}", raw, e)))
        };
        candles.push(Candle::new(
            open_time,
            number(&row.open)?,
            number(&row.high)?,
            number(&row.low)?,
            number(&row.close)?,
            number(&row.volume)?,
        ));
    }
    Ok(candles)
}

/// RFC 3339 문자열 또는 epoch 밀리초를 해석합니다.
pub fn parse_open_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis).single();
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const SAMPLE: &str = "open_time,open,high,low,close,volume\n\
        2024-01-01T00:00:00Z,100,105,99,104,10\n\
        1704070800000,104,106,103,105.5,12.5\n\
        2024-01-01T02:00:00+00:00,105.5,107,105,106,8\n";

    #[test]
    fn test_parse_mixed_time_formats() {
        let candles = parse_candles("sample.csv", SAMPLE.as_bytes()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(
            candles[1].open_time,
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()
        );
        assert_eq!(candles[1].close, dec!(105.5));
        assert_eq!(candles[2].volume, dec!(8));
    }

    #[test]
    fn test_parse_rejects_bad_time() {
        let body = "open_time,open,high,low,close,volume\nyesterday,1,1,1,1,1\n";
        assert!(matches!(
            parse_candles("bad.csv", body.as_bytes()),
            Err(ProviderError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_number() {
        let body = "open_time,open,high,low,close,volume\n1704067200000,abc,1,1,1,1\n";
        assert!(matches!(
            parse_candles("bad.csv", body.as_bytes()),
            Err(ProviderError::Parse { line: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_applies_limit_and_price() {
        let dir = tempfile::tempdir().unwrap();
        let symbol = Symbol::new("BTC", "USDT");
        let provider = CsvMarketData::new(dir.path());
        let mut file = std::fs::File::create(provider.file_path(&symbol, Timeframe::H1)).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let series = provider
            .fetch_candles(&symbol, Timeframe::H1, 2)
            .await
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles[0].close, dec!(105.5));
        assert_eq!(provider.current_price(&symbol).await.unwrap(), dec!(106));

        assert!(matches!(
            provider.fetch_candles(&symbol, Timeframe::D1, 10).await,
            Err(ProviderError::NotFound(_))
        ));
        assert!(matches!(
            provider.current_price(&Symbol::new("ETH", "USDT")).await,
            Err(ProviderError::NotFound(_))
        ));
    }
}
