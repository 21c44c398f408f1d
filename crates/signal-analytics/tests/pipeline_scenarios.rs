//! 신호 파이프라인 시나리오 테스트.
//!
//! 캔들 → 타임프레임별 신호 → 계층 정렬 → 추천/정확도 흐름을 검증합니다.
//!
//! # 실행 방법
//!
//! ```bash
//! cargo test -p signal-analytics --test pipeline_scenarios
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_analytics::{
    risk_reward, AccuracyTracker, BollingerBandsParams, HierarchyAligner, IndicatorEngine,
    IndicatorError, RecommendationBuilder, SignalGenerator, TimeframeOutcome,
};
use signal_core::{
    AccuracyConfig, AccuracyMetric, AlignedEntry, Candle, CandleSeries, Direction, NoDataReason,
    Outcome, Resolution, SignalError, Symbol, Timeframe, TimeframeSignal,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 12, 1, 0).unwrap()
}

fn btc() -> Symbol {
    Symbol::new("BTC", "USDT")
}

/// 종가 목록으로 시계열을 만듭니다. 마지막 캔들은 `now()` 1분 전에 종료됩니다.
fn series_from_closes(timeframe: Timeframe, closes: &[Decimal]) -> CandleSeries {
    let duration = timeframe.chrono_duration();
    let first_open = now() - Duration::minutes(1) - duration * closes.len() as i32;
    let mut previous = closes.first().copied().unwrap_or(dec!(100));
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open = previous;
            previous = *close;
            Candle::new(
                first_open + duration * i as i32,
                open,
                open.max(*close) + dec!(1),
                open.min(*close) - dec!(1),
                *close,
                dec!(100) + Decimal::from(i as u64 % 5),
            )
        })
        .collect();
    CandleSeries::new(btc(), timeframe, candles)
}

fn trending(timeframe: Timeframe, count: usize, step: Decimal) -> CandleSeries {
    let closes: Vec<Decimal> = (0..count)
        .map(|i| dec!(500) + step * Decimal::from(i as u64))
        .collect();
    series_from_closes(timeframe, &closes)
}

fn hand_signal(timeframe: Timeframe, direction: Direction, confidence: Decimal) -> TimeframeSignal {
    let (stop, target) = match direction {
        Direction::Long => (Some(dec!(97)), Some(dec!(104.5))),
        Direction::Short => (Some(dec!(103)), Some(dec!(95.5))),
        Direction::Neutral => (None, None),
    };
    TimeframeSignal {
        symbol: btc(),
        timeframe,
        direction,
        confidence,
        entry_price: dec!(100),
        stop_loss: stop,
        take_profit: target,
        risk_reward_ratio: stop.map(|_| dec!(1.5)),
        atr: dec!(1.5),
        indicators: vec![],
        patterns: vec![],
        support_levels: vec![],
        resistance_levels: vec![],
        timestamp: now(),
        last_candle_time: now() - Duration::hours(1),
    }
}

#[test]
fn test_higher_timeframe_consensus_demotes_short_term_conflict() {
    let requested = [Timeframe::M15, Timeframe::D1, Timeframe::W1];
    let results: BTreeMap<Timeframe, TimeframeOutcome> = [
        hand_signal(Timeframe::W1, Direction::Long, dec!(80)),
        hand_signal(Timeframe::D1, Direction::Long, dec!(80)),
        hand_signal(Timeframe::M15, Direction::Short, dec!(50)),
    ]
    .into_iter()
    .map(|s| (s.timeframe, Ok(s)))
    .collect();

    let set = HierarchyAligner::default().align(&btc(), 1, now(), &requested, &results);

    let m15 = set.get(Timeframe::M15).unwrap();
    let adjustment = m15.adjustment().unwrap();
    assert_eq!(adjustment.penalty, dec!(40));
    assert!(adjustment.demoted);
    let signal = m15.as_signal().unwrap();
    assert_eq!(signal.confidence, dec!(10));
    assert_eq!(signal.direction, Direction::Neutral);
    assert!(signal.take_profit.is_none());

    // 추천은 가장 높은 방향성 타임프레임
    let rec = RecommendationBuilder::default()
        .build(&set, None, now())
        .unwrap();
    assert_eq!(rec.timeframe, Timeframe::W1);
    assert_eq!(rec.leverage, 5);
    assert!(RecommendationBuilder::default()
        .build(&set, Some(Timeframe::M15), now())
        .is_none());
}

#[test]
fn test_generated_pipeline_end_to_end() {
    let generator = SignalGenerator::default();
    let requested = [Timeframe::M15, Timeframe::H4, Timeframe::D1, Timeframe::W1];

    let inputs = [
        trending(Timeframe::W1, 60, dec!(2)),
        trending(Timeframe::D1, 60, dec!(2)),
        trending(Timeframe::M15, 60, dec!(-2)),
    ];
    let mut results: BTreeMap<Timeframe, TimeframeOutcome> = inputs
        .iter()
        .map(|series| {
            let price = series.last().unwrap().close;
            let outcome = generator
                .generate(series, price, now())
                .map_err(|e| NoDataReason::from(&e));
            (series.timeframe, outcome)
        })
        .collect();
    // 4h는 캔들이 부족
    let short = trending(Timeframe::H4, 10, dec!(1));
    results.insert(
        Timeframe::H4,
        generator
            .generate(&short, dec!(509), now())
            .map_err(|e| NoDataReason::from(&e)),
    );

    assert_eq!(
        results[&Timeframe::W1].as_ref().map(|s| s.direction),
        Ok(Direction::Long)
    );
    assert_eq!(
        results[&Timeframe::M15].as_ref().map(|s| s.direction),
        Ok(Direction::Short)
    );

    let set = HierarchyAligner::default().align(&btc(), 7, now(), &requested, &results);
    assert_eq!(set.entries.len(), 4);
    assert_eq!(set.anchor, Direction::Long);
    assert!(matches!(
        set.get(Timeframe::H4),
        Some(AlignedEntry::NoData {
            reason: NoDataReason::InsufficientData {
                required: 50,
                provided: 10
            }
        })
    ));

    let m15 = set.get(Timeframe::M15).unwrap();
    let adjustment = m15.adjustment().unwrap();
    // 5 × (12 - 4)
    assert_eq!(adjustment.penalty, dec!(40));
    assert_eq!(
        m15.as_signal().unwrap().confidence,
        (adjustment.original_confidence - dec!(40)).max(Decimal::ZERO)
    );

    // 정렬은 같은 입력에 대해 멱등
    assert_eq!(
        set,
        HierarchyAligner::default().align(&btc(), 7, now(), &requested, &results)
    );
}

#[test]
fn test_entry_equal_to_stop_is_degenerate() {
    assert_eq!(
        risk_reward(Direction::Long, dec!(100), dec!(100), dec!(105)),
        Err(SignalError::DegenerateRisk {
            entry: dec!(100),
            stop: dec!(100)
        })
    );
}

#[test]
fn test_nineteen_closes_for_twenty_period_bollinger() {
    let closes: Vec<Decimal> = (0..19i64).map(|i| dec!(100) + Decimal::from(i)).collect();
    assert_eq!(
        IndicatorEngine::new().bollinger_bands(&closes, BollingerBandsParams::default()),
        Err(IndicatorError::InsufficientData {
            required: 20,
            provided: 19
        })
    );
}

#[test]
fn test_generated_signal_expires_as_incorrect() {
    let series = trending(Timeframe::H1, 60, dec!(1));
    let price = series.last().unwrap().close;
    let signal = SignalGenerator::default()
        .generate(&series, price, now())
        .unwrap();
    assert!(signal.is_directional());

    let mut tracker = AccuracyTracker::new(btc(), &AccuracyConfig::default());
    assert!(tracker.register(&signal));
    assert_eq!(tracker.metric(Timeframe::H1), AccuracyMetric::NoData);

    // 목표/손절 어느 쪽에도 닿지 않는 관측
    tracker.observe_price(Timeframe::H1, price, now() + Duration::hours(1));
    assert_eq!(tracker.pending_count(), 1);

    assert_eq!(tracker.expire(now() + Duration::hours(48)), 1);
    let record = &tracker.records()[0];
    assert_eq!(record.outcome, Outcome::Incorrect);
    assert_eq!(record.resolution, Some(Resolution::Expired));
    assert_eq!(
        tracker.metric(Timeframe::H1),
        AccuracyMetric::Measured {
            hit_rate: dec!(0),
            resolved_count: 1,
            correct_count: 0
        }
    );
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Long),
        Just(Direction::Short),
        Just(Direction::Neutral)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn generated_signals_are_bounded_and_deterministic(
        steps in prop::collection::vec(-3i64..=3, 60)
    ) {
        let mut close = dec!(300);
        let closes: Vec<Decimal> = steps
            .iter()
            .map(|step| {
                close += Decimal::from(*step);
                close
            })
            .collect();
        let series = series_from_closes(Timeframe::H1, &closes);
        let price = closes[closes.len() - 1];
        let generator = SignalGenerator::default();

        let first = generator.generate(&series, price, now());
        let second = generator.generate(&series, price, now());
        prop_assert_eq!(&first, &second);

        if let Ok(signal) = first {
            prop_assert!(signal.confidence >= Decimal::ZERO);
            prop_assert!(signal.confidence <= Decimal::ONE_HUNDRED);
            if let Some(ratio) = signal.risk_reward_ratio {
                prop_assert!(ratio > Decimal::ZERO);
            }
            prop_assert_eq!(signal.stop_loss.is_some(), signal.is_directional());
        }
    }

    #[test]
    fn alignment_is_idempotent_and_bounded(
        picks in prop::collection::vec((arb_direction(), 0u32..=100), 5)
    ) {
        let requested = [Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1, Timeframe::W1];
        let results: BTreeMap<Timeframe, TimeframeOutcome> = requested
            .iter()
            .zip(picks.iter())
            .map(|(tf, (direction, confidence))| {
                (*tf, Ok(hand_signal(*tf, *direction, Decimal::from(*confidence))))
            })
            .collect();

        let aligner = HierarchyAligner::default();
        let first = aligner.align(&btc(), 1, now(), &requested, &results);
        let second = aligner.align(&btc(), 1, now(), &requested, &results);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.entries.len(), requested.len());

        for entry in first.entries.values() {
            let signal = entry.as_signal().unwrap();
            prop_assert!(signal.confidence >= Decimal::ZERO);
            prop_assert!(signal.confidence <= Decimal::ONE_HUNDRED);
        }
    }
}
