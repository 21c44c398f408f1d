//! 완성된 캔들 창.
//!
//! 공급자가 돌려주는 시계열의 마지막 캔들은 아직 진행 중일 수 있습니다.
//! 신호는 기준 시점까지 종료된 캔들만으로 계산합니다.
//!
//! ## 예시
//!
//! - 타임프레임: 1시간봉, 기준 시점 10:07
//! - **완성**: 09:00~10:00 캔들
//! - **진행 중**: 10:00~11:00 캔들 (제외)

use chrono::{DateTime, Utc};
use signal_core::{Candle, Timeframe};

/// 완성 캔들 필터.
pub struct SeriesWindow;

impl SeriesWindow {
    /// 캔들이 기준 시점에 종료되었는지 확인합니다.
    #[inline]
    pub fn is_completed_at(candle: &Candle, timeframe: Timeframe, now: DateTime<Utc>) -> bool {
        candle.close_time(timeframe) <= now
    }

    /// 기준 시점까지 종료된 캔들 (시간순 유지).
    ///
    /// 시간순 시계열을 가정하므로 뒤쪽의 진행 중 캔들만 잘라냅니다.
    pub fn completed_candles(
        candles: &[Candle],
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> &[Candle] {
        let end = candles
            .iter()
            .rposition(|c| Self::is_completed_at(c, timeframe, now))
            .map_or(0, |i| i + 1);
        &candles[..end]
    }

    /// 가장 최근에 종료된 캔들.
    pub fn latest_completed(
        candles: &[Candle],
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Option<&Candle> {
        Self::completed_candles(candles, timeframe, now).last()
    }

    /// 가장 최근에 종료된 `count`개 캔들 (시간순).
    pub fn latest_n_completed(
        candles: &[Candle],
        timeframe: Timeframe,
        now: DateTime<Utc>,
        count: usize,
    ) -> &[Candle] {
        let completed = Self::completed_candles(candles, timeframe, now);
        &completed[completed.len().saturating_sub(count)..]
    }

    /// 두 시점 사이에 들어가는 완성 캔들 수.
    pub fn count_candles_between(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timeframe: Timeframe,
    ) -> u64 {
        if end <= start {
            return 0;
        }
        let elapsed = (end - start).num_seconds() as u64;
        elapsed / timeframe.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn hourly(count: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                Candle::new(
                    start + Duration::hours(i as i64),
                    dec!(100),
                    dec!(101),
                    dec!(99),
                    dec!(100),
                    dec!(1),
                )
            })
            .collect()
    }

    #[test]
    fn test_in_progress_candle_is_excluded() {
        let candles = hourly(11);
        // 10:07 기준: 10:00 시작 캔들은 진행 중
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 0).unwrap();
        let completed = SeriesWindow::completed_candles(&candles, Timeframe::H1, now);
        assert_eq!(completed.len(), 10);
        assert_eq!(
            SeriesWindow::latest_completed(&candles, Timeframe::H1, now).map(|c| c.open_time),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_candle_closing_exactly_now_is_completed() {
        let candles = hourly(3);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        assert_eq!(SeriesWindow::completed_candles(&candles, Timeframe::H1, now).len(), 3);
    }

    #[test]
    fn test_latest_n_completed() {
        let candles = hourly(11);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 0).unwrap();
        let last_three = SeriesWindow::latest_n_completed(&candles, Timeframe::H1, now, 3);
        assert_eq!(last_three.len(), 3);
        assert_eq!(last_three[2].open_time, candles[9].open_time);

        let all = SeriesWindow::latest_n_completed(&candles, Timeframe::H1, now, 100);
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_nothing_completed_yet() {
        let candles = hourly(2);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap();
        assert!(SeriesWindow::completed_candles(&candles, Timeframe::H1, now).is_empty());
        assert!(SeriesWindow::latest_completed(&candles, Timeframe::H1, now).is_none());
    }

    #[test]
    fn test_count_candles_between() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 2, 59, 0).unwrap();
        assert_eq!(SeriesWindow::count_candles_between(start, end, Timeframe::H1), 2);
        assert_eq!(SeriesWindow::count_candles_between(end, start, Timeframe::H1), 0);
    }
}
