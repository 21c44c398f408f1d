//! 캔들스틱 패턴 감지.
//!
//! 창의 마지막 캔들에서 완성되는 패턴만 평가합니다.
//!
//! ## 지원 패턴
//! - **장악형 (Engulfing)**: 직전 몸통을 완전히 감싸는 반대 방향 캔들
//! - **도지 (Doji)**: 몸통/범위 비율이 임계값 미만
//! - **망치형 / 교수형**: 긴 아랫꼬리, 하락 추세면 망치형, 상승 추세면 교수형
//! - **역망치형 / 유성형**: 긴 윗꼬리, 하락 추세면 역망치형, 상승 추세면 유성형
//! - **샛별 / 석별 (Morning/Evening Star)**: 장대 캔들, 작은 몸통, 첫 캔들 중간값을 넘는 마감
//!
//! ## 신뢰도
//! 기하 품질(0~30), 거래량 확인(0~20), 추세 맥락(0~20)을 기본값 30에 더해 [0, 100]으로 제한합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signal_core::{Candle, PatternBias, PatternFormation, PatternKind};

use crate::indicators::{IndicatorError, IndicatorResult};

/// 패턴 감지에 필요한 최소 캔들 수.
pub const MIN_PATTERN_CANDLES: usize = 5;

/// 캔들스틱 패턴 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandlestickParams {
    /// 도지 판단 몸통/범위 비율 (기본: 0.1)
    pub body_ratio_threshold: Decimal,
    /// 망치형 계열의 꼬리/몸통 비율 (기본: 2.0)
    pub shadow_ratio_threshold: Decimal,
    /// 추세 판단 기간 (기본: 5)
    pub trend_period: usize,
    /// 추세로 인정하는 변화율 (기본: 1%)
    pub trend_threshold: Decimal,
    /// 거래량 평균 기간 (기본: 10)
    pub volume_period: usize,
}

impl Default for CandlestickParams {
    fn default() -> Self {
        Self {
            body_ratio_threshold: dec!(0.1),
            shadow_ratio_threshold: dec!(2.0),
            trend_period: 5,
            trend_threshold: dec!(0.01),
            volume_period: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Up,
    Down,
    Sideways,
}

/// 캔들스틱 패턴 감지기.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandlestickDetector {
    params: CandlestickParams,
}

impl CandlestickDetector {
    pub fn new(params: CandlestickParams) -> Self {
        Self { params }
    }

    /// 마지막 캔들에서 완성되는 패턴을 감지합니다.
    ///
    /// # 반환
    /// 감지된 패턴 목록 (없으면 빈 벡터). 캔들이 5개 미만이면 `InsufficientData`.
    pub fn detect(&self, candles: &[Candle]) -> IndicatorResult<Vec<PatternFormation>> {
        if candles.len() < MIN_PATTERN_CANDLES {
            return Err(IndicatorError::InsufficientData {
                required: MIN_PATTERN_CANDLES,
                provided: candles.len(),
            });
        }

        let last = candles.len() - 1;
        let mut found = Vec::new();

        if let Some(q) = self.doji_quality(&candles[last]) {
            found.push(self.formation(candles, PatternKind::Doji, last, 1, q, Trend::Sideways));
        } else {
            let trend = self.trend_before(candles, last);
            if let Some((kind, q)) = self.single_candle(&candles[last], trend) {
                found.push(self.formation(candles, kind, last, 1, q, trend));
            }
        }

        let trend = self.trend_before(candles, last - 1);
        if let Some((kind, q)) = engulfing(&candles[last - 1], &candles[last]) {
            found.push(self.formation(candles, kind, last, 2, q, trend));
        }

        let trend = self.trend_before(candles, last - 2);
        if let Some((kind, q)) = self.star(&candles[last - 2..=last]) {
            found.push(self.formation(candles, kind, last, 3, q, trend));
        }

        Ok(found)
    }

    fn doji_quality(&self, candle: &Candle) -> Option<Decimal> {
        let range = candle.range();
        if range.is_zero() {
            return None;
        }
        let ratio = candle.body() / range;
        (ratio < self.params.body_ratio_threshold)
            .then(|| Decimal::ONE - ratio / self.params.body_ratio_threshold)
    }

    /// 망치형/교수형/역망치형/유성형. 횡보 구간에서는 판단하지 않습니다.
    fn single_candle(&self, candle: &Candle, trend: Trend) -> Option<(PatternKind, Decimal)> {
        let body = candle.body();
        if body.is_zero() || trend == Trend::Sideways {
            return None;
        }
        let lower = candle.lower_shadow();
        let upper = candle.upper_shadow();
        let min_shadow = body * self.params.shadow_ratio_threshold;
        let quality = |shadow: Decimal| (shadow / (body * dec!(4))).min(Decimal::ONE);

        if lower >= min_shadow && upper <= body {
            let kind = if trend == Trend::Down {
                PatternKind::Hammer
            } else {
                PatternKind::HangingMan
            };
            return Some((kind, quality(lower)));
        }
        if upper >= min_shadow && lower <= body {
            let kind = if trend == Trend::Down {
                PatternKind::InvertedHammer
            } else {
                PatternKind::ShootingStar
            };
            return Some((kind, quality(upper)));
        }
        None
    }

    fn star(&self, three: &[Candle]) -> Option<(PatternKind, Decimal)> {
        let (first, middle, last) = (&three[0], &three[1], &three[2]);
        let first_range = first.range();
        if first_range.is_zero() || first.body() / first_range < dec!(0.5) {
            return None;
        }
        if middle.body() > first.body() * dec!(0.3) {
            return None;
        }

        let half_body = first.body() / Decimal::TWO;
        let midpoint = first.body_midpoint();
        if first.is_bearish() && last.is_bullish() && last.close > midpoint {
            let q = ((last.close - midpoint) / half_body).min(Decimal::ONE);
            return Some((PatternKind::MorningStar, q));
        }
        if first.is_bullish() && last.is_bearish() && last.close < midpoint {
            let q = ((midpoint - last.close) / half_body).min(Decimal::ONE);
            return Some((PatternKind::EveningStar, q));
        }
        None
    }

    /// 패턴 첫 캔들(`start`) 바로 앞 캔들까지의 추세.
    fn trend_before(&self, candles: &[Candle], start: usize) -> Trend {
        if start == 0 {
            return Trend::Sideways;
        }
        let reference = start - 1;
        let from = reference.saturating_sub(self.params.trend_period);
        let base = candles[from].close;
        if from == reference || base.is_zero() {
            return Trend::Sideways;
        }
        let change = (candles[reference].close - base) / base;
        if change > self.params.trend_threshold {
            Trend::Up
        } else if change < -self.params.trend_threshold {
            Trend::Down
        } else {
            Trend::Sideways
        }
    }

    fn volume_bonus(&self, candles: &[Candle], last: usize) -> Decimal {
        let from = last.saturating_sub(self.params.volume_period);
        let previous = &candles[from..last];
        if previous.is_empty() {
            return Decimal::ZERO;
        }
        let average =
            previous.iter().map(|c| c.volume).sum::<Decimal>() / Decimal::from(previous.len());
        if average.is_zero() {
            return Decimal::ZERO;
        }
        let ratio = candles[last].volume / average;
        if ratio >= dec!(1.5) {
            dec!(20)
        } else if ratio >= Decimal::ONE {
            dec!(10)
        } else {
            Decimal::ZERO
        }
    }

    fn formation(
        &self,
        candles: &[Candle],
        kind: PatternKind,
        last: usize,
        width: usize,
        quality: Decimal,
        trend: Trend,
    ) -> PatternFormation {
        let bias = kind.bias();
        let trend_bonus = match (bias, trend) {
            (PatternBias::Bullish, Trend::Down) | (PatternBias::Bearish, Trend::Up) => dec!(20),
            _ => Decimal::ZERO,
        };
        let reliability =
            dec!(30) + dec!(30) * quality + self.volume_bonus(candles, last) + trend_bonus;

        let span = &candles[last + 1 - width..=last];
        let high = span.iter().map(|c| c.high).max().unwrap_or_default();
        let low = span.iter().map(|c| c.low).min().unwrap_or_default();
        let close = candles[last].close;
        let projected_price = match bias {
            PatternBias::Bullish => Some(close + (high - low)),
            PatternBias::Bearish => Some((close - (high - low)).max(Decimal::ZERO)),
            PatternBias::Neutral => None,
        };

        let description = format!(
            "{} ({}캔들, 종가 {}, 범위 {})",
            kind.display_name(),
            width,
            close,
            high - low
        );
        PatternFormation::new(
            kind,
            reliability.round_dp(2),
            projected_price,
            last,
            description,
        )
    }
}

fn engulfing(prev: &Candle, curr: &Candle) -> Option<(PatternKind, Decimal)> {
    let prev_body = prev.body();
    if prev_body.is_zero() || curr.body() <= prev_body {
        return None;
    }
    let quality = (curr.body() / prev_body / Decimal::TWO).min(Decimal::ONE);

    if prev.is_bearish() && curr.is_bullish() && curr.open <= prev.close && curr.close >= prev.open
    {
        return Some((PatternKind::BullishEngulfing, quality));
    }
    if prev.is_bullish() && curr.is_bearish() && curr.open >= prev.close && curr.close <= prev.open
    {
        return Some((PatternKind::BearishEngulfing, quality));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles(ohlc: &[(Decimal, Decimal, Decimal, Decimal)]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ohlc.iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| {
                Candle::new(start + Duration::hours(i as i64), *o, *h, *l, *c, dec!(100))
            })
            .collect()
    }

    fn kinds(found: &[PatternFormation]) -> Vec<PatternKind> {
        found.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_requires_five_candles() {
        let series = candles(&[(dec!(10), dec!(11), dec!(9), dec!(10)); 4]);
        assert!(matches!(
            CandlestickDetector::default().detect(&series),
            Err(IndicatorError::InsufficientData { required: 5, provided: 4 })
        ));
    }

    #[test]
    fn test_bullish_engulfing() {
        let series = candles(&[
            (dec!(110), dec!(111), dec!(107), dec!(108)),
            (dec!(108), dec!(109), dec!(105), dec!(106)),
            (dec!(106), dec!(107), dec!(103), dec!(104)),
            (dec!(104), dec!(104.5), dec!(101), dec!(102)),
            (dec!(101.5), dec!(106), dec!(101), dec!(105)),
        ]);
        let found = CandlestickDetector::default().detect(&series).unwrap();
        let engulfing = found
            .iter()
            .find(|p| p.kind == PatternKind::BullishEngulfing)
            .expect("engulfing");
        assert_eq!(engulfing.bias, PatternBias::Bullish);
        assert_eq!(engulfing.index, 4);
        // 하락 추세 맥락 보너스 포함
        assert!(engulfing.reliability >= dec!(70));
        // 종가 + 패턴 범위 (106 - 101)
        assert_eq!(engulfing.projected_price, Some(dec!(110)));
    }

    #[test]
    fn test_doji() {
        let series = candles(&[
            (dec!(100), dec!(101), dec!(99), dec!(100.5)),
            (dec!(100.5), dec!(102), dec!(100), dec!(101)),
            (dec!(101), dec!(102), dec!(100), dec!(101.5)),
            (dec!(101.5), dec!(103), dec!(101), dec!(102)),
            (dec!(102), dec!(104), dec!(100), dec!(102.1)),
        ]);
        let found = CandlestickDetector::default().detect(&series).unwrap();
        assert!(kinds(&found).contains(&PatternKind::Doji));
        let doji = found.iter().find(|p| p.kind == PatternKind::Doji).unwrap();
        assert_eq!(doji.projected_price, None);
    }

    #[test]
    fn test_hammer_in_downtrend_and_hanging_man_in_uptrend() {
        // 하락 추세 후 긴 아랫꼬리
        let down = candles(&[
            (dec!(120), dec!(121), dec!(115), dec!(116)),
            (dec!(116), dec!(117), dec!(111), dec!(112)),
            (dec!(112), dec!(113), dec!(107), dec!(108)),
            (dec!(108), dec!(109), dec!(103), dec!(104)),
            (dec!(103), dec!(104.2), dec!(96), dec!(104)),
        ]);
        assert!(kinds(&CandlestickDetector::default().detect(&down).unwrap())
            .contains(&PatternKind::Hammer));

        // 같은 모양, 상승 추세
        let up = candles(&[
            (dec!(80), dec!(85), dec!(79), dec!(84)),
            (dec!(84), dec!(89), dec!(83), dec!(88)),
            (dec!(88), dec!(93), dec!(87), dec!(92)),
            (dec!(92), dec!(97), dec!(91), dec!(96)),
            (dec!(103), dec!(104.2), dec!(96), dec!(104)),
        ]);
        assert!(kinds(&CandlestickDetector::default().detect(&up).unwrap())
            .contains(&PatternKind::HangingMan));
    }

    #[test]
    fn test_shooting_star_in_uptrend() {
        let series = candles(&[
            (dec!(80), dec!(85), dec!(79), dec!(84)),
            (dec!(84), dec!(89), dec!(83), dec!(88)),
            (dec!(88), dec!(93), dec!(87), dec!(92)),
            (dec!(92), dec!(97), dec!(91), dec!(96)),
            (dec!(97), dec!(105), dec!(95.8), dec!(96)),
        ]);
        let found = CandlestickDetector::default().detect(&series).unwrap();
        assert!(kinds(&found).contains(&PatternKind::ShootingStar));
    }

    #[test]
    fn test_morning_star() {
        let series = candles(&[
            (dec!(120), dec!(121), dec!(116), dec!(117)),
            (dec!(117), dec!(118), dec!(112), dec!(113)),
            (dec!(113), dec!(113.5), dec!(102), dec!(103)),
            (dec!(102), dec!(102.8), dec!(100.5), dec!(101.5)),
            (dec!(102), dec!(110), dec!(101.8), dec!(109.5)),
        ]);
        let found = CandlestickDetector::default().detect(&series).unwrap();
        assert!(kinds(&found).contains(&PatternKind::MorningStar));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let series = candles(&[
            (dec!(110), dec!(111), dec!(107), dec!(108)),
            (dec!(108), dec!(109), dec!(105), dec!(106)),
            (dec!(106), dec!(107), dec!(103), dec!(104)),
            (dec!(104), dec!(104.5), dec!(101), dec!(102)),
            (dec!(101.5), dec!(106), dec!(101), dec!(105)),
        ]);
        let detector = CandlestickDetector::default();
        assert_eq!(detector.detect(&series).unwrap(), detector.detect(&series).unwrap());
    }
}
