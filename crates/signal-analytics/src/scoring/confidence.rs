//! 가중 투표 기반 방향 결정과 신뢰도.
//!
//! 각 판독값은 `분류 가중치 × 강도 배수`만큼 투표합니다.
//!
//! | 분류 | 가중치 | | 강도 | 배수 |
//! |------|--------|-|------|------|
//! | trend | 3.0 | | strong | 1.0 |
//! | momentum | 2.0 | | moderate | 0.75 |
//! | pattern | 1.5 | | weak | 0.5 |
//! | volatility, volume | 1.0 | | | |
//!
//! 순 투표 비율 `net = (buy - sell) / total`이 임계값(기본 0.15) 이상이면 LONG,
//! `-임계값` 이하이면 SHORT입니다. `total`에는 NEUTRAL 투표도 포함됩니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signal_core::{
    CategoryWeights, ConfidenceBucket, Direction, GeneratorConfig, IndicatorCategory,
    IndicatorReading, IndicatorVote, SignalStrength,
};
use std::collections::BTreeMap;

/// 분류별 투표 집계.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    /// 매수 가중치 합
    pub buy_weight: Decimal,
    /// 매도 가중치 합
    pub sell_weight: Decimal,
    /// 전체 가중치 합 (NEUTRAL 포함)
    pub total_weight: Decimal,
    /// 분류별 (매수, 매도) 가중치
    pub by_category: BTreeMap<IndicatorCategory, (Decimal, Decimal)>,
}

impl VoteTally {
    /// 순 투표 비율 (-1 ~ 1). 투표가 없으면 0.
    pub fn net(&self) -> Decimal {
        if self.total_weight.is_zero() {
            return Decimal::ZERO;
        }
        (self.buy_weight - self.sell_weight) / self.total_weight
    }

    /// 방향성 투표 가중치 합.
    pub fn directional_weight(&self) -> Decimal {
        self.buy_weight + self.sell_weight
    }

    /// 방향성 투표를 한 분류 수.
    pub fn voted_categories(&self) -> usize {
        self.by_category
            .values()
            .filter(|(buy, sell)| !buy.is_zero() || !sell.is_zero())
            .count()
    }

    /// 분류 내 우세 투표가 방향과 같은 분류 수.
    pub fn concurring_categories(&self, direction: Direction) -> usize {
        self.by_category
            .values()
            .filter(|(buy, sell)| match direction {
                Direction::Long => buy > sell,
                Direction::Short => sell > buy,
                Direction::Neutral => false,
            })
            .count()
    }
}

/// 방향과 신뢰도.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVote {
    pub direction: Direction,
    /// 신뢰도 (0 ~ 100, 소수점 2자리)
    pub confidence: Decimal,
    pub net: Decimal,
    pub tally: VoteTally,
}

impl ScoredVote {
    pub fn bucket(&self) -> ConfidenceBucket {
        ConfidenceBucket::from_confidence(self.confidence)
    }
}

/// 신뢰도 계산기.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    weights: CategoryWeights,
    threshold: Decimal,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl ConfidenceScorer {
    /// 새 계산기를 생성합니다.
    ///
    /// # 인자
    /// * `weights` - 분류별 가중치
    /// * `threshold` - LONG/SHORT 판정 임계값 (0 ~ 1)
    pub fn new(weights: CategoryWeights, threshold: Decimal) -> Self {
        Self { weights, threshold }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.weights.clone(), config.direction_threshold)
    }

    /// 분류 가중치.
    pub fn category_weight(&self, category: IndicatorCategory) -> Decimal {
        match category {
            IndicatorCategory::Trend => self.weights.trend,
            IndicatorCategory::Momentum => self.weights.momentum,
            IndicatorCategory::Pattern => self.weights.pattern,
            IndicatorCategory::Volatility => self.weights.volatility,
            IndicatorCategory::Volume => self.weights.volume,
        }
    }

    /// 강도 배수.
    pub fn strength_multiplier(strength: SignalStrength) -> Decimal {
        match strength {
            SignalStrength::Strong => Decimal::ONE,
            SignalStrength::Moderate => dec!(0.75),
            SignalStrength::Weak => dec!(0.5),
        }
    }

    /// 판독값 하나의 투표 가중치.
    pub fn reading_weight(&self, reading: &IndicatorReading) -> Decimal {
        self.category_weight(reading.category) * Self::strength_multiplier(reading.strength)
    }

    /// 투표를 집계합니다.
    pub fn tally(&self, readings: &[IndicatorReading]) -> VoteTally {
        let mut tally = VoteTally::default();
        for reading in readings {
            let weight = self.reading_weight(reading);
            tally.total_weight += weight;
            let entry = tally
                .by_category
                .entry(reading.category)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            match reading.vote {
                IndicatorVote::Buy => {
                    tally.buy_weight += weight;
                    entry.0 += weight;
                }
                IndicatorVote::Sell => {
                    tally.sell_weight += weight;
                    entry.1 += weight;
                }
                IndicatorVote::Neutral => {}
            }
        }
        tally
    }

    /// 순 투표 비율에서 방향을 결정합니다.
    pub fn direction(&self, tally: &VoteTally) -> Direction {
        let net = tally.net();
        if net >= self.threshold {
            Direction::Long
        } else if net <= -self.threshold {
            Direction::Short
        } else {
            Direction::Neutral
        }
    }

    /// 신뢰도 (0 ~ 100).
    ///
    /// - LONG/SHORT: `일치 가중치 / 방향성 가중치 × (0.5 + 0.5 × 동의 분류 / 투표 분류) × 100`
    /// - NEUTRAL: `(1 - |net| / 임계값) × 100`. 판독값이 없으면 0.
    pub fn confidence(&self, tally: &VoteTally, direction: Direction) -> Decimal {
        let raw = match direction {
            Direction::Long | Direction::Short => {
                let directional = tally.directional_weight();
                let voted = tally.voted_categories();
                if directional.is_zero() || voted == 0 {
                    return Decimal::ZERO;
                }
                let agreeing = if direction == Direction::Long {
                    tally.buy_weight
                } else {
                    tally.sell_weight
                };
                let agreement = agreeing / directional;
                let concurrence = Decimal::from(tally.concurring_categories(direction))
                    / Decimal::from(voted);
                agreement * (dec!(0.5) + dec!(0.5) * concurrence) * Decimal::ONE_HUNDRED
            }
            Direction::Neutral => {
                if tally.total_weight.is_zero() || self.threshold.is_zero() {
                    return Decimal::ZERO;
                }
                (Decimal::ONE - tally.net().abs() / self.threshold) * Decimal::ONE_HUNDRED
            }
        };
        raw.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// 집계, 방향, 신뢰도를 한 번에 계산합니다.
    pub fn score(&self, readings: &[IndicatorReading]) -> ScoredVote {
        let tally = self.tally(readings);
        let direction = self.direction(&tally);
        let confidence = self.confidence(&tally, direction);
        ScoredVote {
            direction,
            confidence,
            net: tally.net(),
            tally,
        }
    }

    /// 신뢰도 구간.
    pub fn bucket(&self, confidence: Decimal) -> ConfidenceBucket {
        ConfidenceBucket::from_confidence(confidence)
    }
}
