//! 예측 정확도 추적.
//!
//! 심볼 하나당 하나의 추적기를 둡니다. 방향성 신호가 나올 때마다 대기 중 기록이
//! 추가되고, 이후 가격 관측이나 만료로 결과가 한 번만 확정됩니다.
//!
//! # 확정 규칙
//!
//! - LONG: 고가 ≥ 목표가 → 적중, 저가 ≤ 손절가 → 실패 (SHORT는 반대)
//! - 한 캔들이 목표가와 손절가를 모두 건드리면 실패
//! - `expires_at`이 지나도록 대기 중이면 실패 (만료)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use signal_core::{
    AccuracyConfig, AccuracyMetric, AccuracyRecord, Candle, Direction, Outcome, Resolution, Symbol,
    Timeframe, TimeframeSignal,
};
use tracing::debug;

/// 심볼별 정확도 추적기.
#[derive(Debug, Clone)]
pub struct AccuracyTracker {
    symbol: Symbol,
    /// 추가 순서대로 보관하는 기록 (삭제하지 않음)
    records: Vec<AccuracyRecord>,
    max_pending_candles: u32,
    rolling_window: usize,
}

impl AccuracyTracker {
    /// 새 추적기를 생성합니다.
    pub fn new(symbol: Symbol, config: &AccuracyConfig) -> Self {
        Self {
            symbol,
            records: Vec::new(),
            max_pending_candles: config.max_pending_candles,
            rolling_window: config.rolling_window.max(1),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// 전체 기록 (추가 순).
    pub fn records(&self) -> &[AccuracyRecord] {
        &self.records
    }

    /// 대기 중 기록 수.
    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_pending()).count()
    }

    /// 방향성 신호를 대기 중 기록으로 추가합니다.
    ///
    /// # 반환
    /// 새 기록이 추가되었으면 `true`. NEUTRAL 신호, 다른 심볼,
    /// 이미 등록된 (타임프레임, 시각) 조합은 무시합니다.
    pub fn register(&mut self, signal: &TimeframeSignal) -> bool {
        if signal.symbol != self.symbol {
            return false;
        }
        let Some(record) = AccuracyRecord::from_signal(signal, self.max_pending_candles) else {
            return false;
        };
        if self.records.iter().any(|r| r.id == record.id) {
            debug!(
                symbol = %self.symbol,
                timeframe = %signal.timeframe,
                "이미 등록된 예측 무시"
            );
            return false;
        }
        self.records.push(record);
        true
    }

    /// 단일 가격 관측을 반영합니다.
    ///
    /// # 반환
    /// 이번 관측으로 확정된 기록 수
    pub fn observe_price(&mut self, timeframe: Timeframe, price: Decimal, at: DateTime<Utc>) -> usize {
        self.observe_range(timeframe, price, price, at, |record| at > record.predicted_at)
    }

    /// 캔들의 고가/저가를 반영합니다.
    ///
    /// 예측 시각 이후에 시작한 캔들만 반영하며, 확정 시각은 캔들 종료 시간입니다.
    pub fn observe_candle(&mut self, timeframe: Timeframe, candle: &Candle) -> usize {
        let at = candle.close_time(timeframe);
        let open_time = candle.open_time;
        self.observe_range(timeframe, candle.high, candle.low, at, |record| {
            open_time >= record.predicted_at
        })
    }

    fn observe_range<F>(
        &mut self,
        timeframe: Timeframe,
        high: Decimal,
        low: Decimal,
        at: DateTime<Utc>,
        after_prediction: F,
    ) -> usize
    where
        F: Fn(&AccuracyRecord) -> bool,
    {
        let mut resolved = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.is_pending() && r.timeframe == timeframe)
        {
            if !after_prediction(record) {
                continue;
            }
            if at > record.expires_at {
                record.resolve(Outcome::Incorrect, Resolution::Expired, record.expires_at);
                resolved += 1;
                continue;
            }

            let (target_hit, stop_hit) = match record.predicted_direction {
                Direction::Long => (high >= record.take_profit, low <= record.stop_loss),
                Direction::Short => (low <= record.take_profit, high >= record.stop_loss),
                Direction::Neutral => continue,
            };
            if stop_hit {
                record.resolve(Outcome::Incorrect, Resolution::StopHit, at);
            } else if target_hit {
                record.resolve(Outcome::Correct, Resolution::TargetHit, at);
            } else {
                continue;
            }
            debug!(
                symbol = %record.symbol,
                timeframe = %record.timeframe,
                outcome = ?record.outcome,
                "예측 결과 확정"
            );
            resolved += 1;
        }
        resolved
    }

    /// 만료 시각이 지난 대기 중 기록을 실패로 확정합니다.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.is_pending() && r.expires_at <= now)
        {
            record.resolve(Outcome::Incorrect, Resolution::Expired, record.expires_at);
            expired += 1;
        }
        if expired > 0 {
            debug!(symbol = %self.symbol, expired, "만료된 예측 정리");
        }
        expired
    }

    /// 타임프레임별 최근 확정 기록 기준 적중률.
    pub fn metric(&self, timeframe: Timeframe) -> AccuracyMetric {
        let mut resolved: Vec<&AccuracyRecord> = self
            .records
            .iter()
            .filter(|r| r.timeframe == timeframe && !r.is_pending())
            .collect();
        if resolved.is_empty() {
            return AccuracyMetric::NoData;
        }
        resolved.sort_by_key(|r| (r.resolved_at, r.predicted_at));
        let window = &resolved[resolved.len().saturating_sub(self.rolling_window)..];

        let correct_count = window
            .iter()
            .filter(|r| r.outcome == Outcome::Correct)
            .count();
        let hit_rate = (Decimal::from(correct_count) / Decimal::from(window.len())
            * Decimal::ONE_HUNDRED)
            .round_dp(2);

        AccuracyMetric::Measured {
            hit_rate,
            resolved_count: window.len(),
            correct_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn symbol() -> Symbol {
        Symbol::new("BTC", "USDT")
    }

    fn signal(direction: Direction, at: DateTime<Utc>) -> TimeframeSignal {
        let (stop, target) = match direction {
            Direction::Long => (dec!(95), dec!(110)),
            _ => (dec!(105), dec!(90)),
        };
        TimeframeSignal {
            symbol: symbol(),
            timeframe: Timeframe::H1,
            direction,
            confidence: dec!(70),
            entry_price: dec!(100),
            stop_loss: Some(stop),
            take_profit: Some(target),
            risk_reward_ratio: Some(dec!(2)),
            atr: dec!(3),
            indicators: vec![],
            patterns: vec![],
            support_levels: vec![],
            resistance_levels: vec![],
            timestamp: at,
            last_candle_time: at - Duration::hours(1),
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn tracker() -> AccuracyTracker {
        AccuracyTracker::new(symbol(), &AccuracyConfig::default())
    }

    #[test]
    fn test_no_resolved_records_is_no_data() {
        let mut tracker = tracker();
        tracker.register(&signal(Direction::Long, start()));
        assert_eq!(tracker.metric(Timeframe::H1), AccuracyMetric::NoData);
    }

    #[test]
    fn test_neutral_and_duplicates_ignored() {
        let mut tracker = tracker();
        let mut neutral = signal(Direction::Long, start());
        neutral.demote_to_neutral();
        assert!(!tracker.register(&neutral));

        assert!(tracker.register(&signal(Direction::Long, start())));
        assert!(!tracker.register(&signal(Direction::Long, start())));
        assert_eq!(tracker.records().len(), 1);
    }

    #[test]
    fn test_long_target_hit() {
        let mut tracker = tracker();
        tracker.register(&signal(Direction::Long, start()));

        // 예측 시각 이전 관측은 무시
        assert_eq!(tracker.observe_price(Timeframe::H1, dec!(120), start()), 0);
        assert_eq!(
            tracker.observe_price(Timeframe::H1, dec!(110), start() + Duration::minutes(30)),
            1
        );
        let record = &tracker.records()[0];
        assert_eq!(record.outcome, Outcome::Correct);
        assert_eq!(record.resolution, Some(Resolution::TargetHit));
        assert_eq!(
            tracker.metric(Timeframe::H1),
            AccuracyMetric::Measured {
                hit_rate: dec!(100),
                resolved_count: 1,
                correct_count: 1
            }
        );
    }

    #[test]
    fn test_short_stop_hit() {
        let mut tracker = tracker();
        tracker.register(&signal(Direction::Short, start()));
        tracker.observe_price(Timeframe::H1, dec!(105.5), start() + Duration::minutes(5));
        assert_eq!(tracker.records()[0].outcome, Outcome::Incorrect);
        assert_eq!(tracker.records()[0].resolution, Some(Resolution::StopHit));
    }

    #[test]
    fn test_candle_touching_both_is_incorrect() {
        let mut tracker = tracker();
        tracker.register(&signal(Direction::Long, start()));
        let candle = Candle::new(start(), dec!(100), dec!(111), dec!(94), dec!(101), dec!(5));
        assert_eq!(tracker.observe_candle(Timeframe::H1, &candle), 1);
        assert_eq!(tracker.records()[0].outcome, Outcome::Incorrect);
        assert_eq!(
            tracker.records()[0].resolved_at,
            Some(start() + Duration::hours(1))
        );
    }

    #[test]
    fn test_expired_record_is_incorrect() {
        let mut tracker = tracker();
        tracker.register(&signal(Direction::Long, start()));

        assert_eq!(tracker.expire(start() + Duration::hours(47)), 0);
        assert_eq!(tracker.expire(start() + Duration::hours(48)), 1);

        let record = &tracker.records()[0];
        assert_eq!(record.outcome, Outcome::Incorrect);
        assert_eq!(record.resolution, Some(Resolution::Expired));
        assert_eq!(tracker.metric(Timeframe::H1).hit_rate(), Some(dec!(0)));
    }

    #[test]
    fn test_unrepresentable_expiry_is_not_registered() {
        let config = AccuracyConfig {
            max_pending_candles: u32::MAX,
            rolling_window: 50,
        };
        let mut tracker = AccuracyTracker::new(symbol(), &config);
        let mut weekly = signal(Direction::Long, start());
        weekly.timeframe = Timeframe::W1;
        assert!(!tracker.register(&weekly));
        assert!(tracker.records().is_empty());
    }

    #[test]
    fn test_rolling_window() {
        let config = AccuracyConfig {
            max_pending_candles: 48,
            rolling_window: 2,
        };
        let mut tracker = AccuracyTracker::new(symbol(), &config);
        for i in 0..3 {
            let at = start() + Duration::hours(i);
            tracker.register(&signal(Direction::Long, at));
            let price = if i == 0 { dec!(90) } else { dec!(115) };
            tracker.observe_price(Timeframe::H1, price, at + Duration::minutes(10));
        }
        // 첫 번째(실패)는 창 밖
        assert_eq!(tracker.metric(Timeframe::H1).hit_rate(), Some(dec!(100)));
        assert_eq!(tracker.metric(Timeframe::H4), AccuracyMetric::NoData);
    }
}
