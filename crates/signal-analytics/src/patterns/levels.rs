//! 스윙 포인트 기반 지지/저항 레벨.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signal_core::Candle;

use super::{swing_highs, swing_lows};

/// 레벨 계산 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelParams {
    /// 프랙탈 좌우 폭
    pub fractal_span: usize,
    /// 병합 허용 오차 (비율, 기본: 0.5%)
    pub merge_tolerance: Decimal,
    /// 방향별 최대 레벨 수
    pub max_levels: usize,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            fractal_span: 2,
            merge_tolerance: dec!(0.005),
            max_levels: 3,
        }
    }
}

/// 지지/저항 레벨 (현재가에서 가까운 순).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Vec<Decimal>,
    pub resistance: Vec<Decimal>,
}

/// 현재가 아래 스윙 저점을 지지선으로, 위 스윙 고점을 저항선으로 모읍니다.
///
/// 허용 오차 안에 있는 레벨은 평균값 하나로 병합합니다.
pub fn support_resistance(
    candles: &[Candle],
    price: Decimal,
    params: LevelParams,
) -> SupportResistance {
    let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();
    let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();

    let support: Vec<Decimal> = swing_lows(&lows, params.fractal_span)
        .into_iter()
        .map(|i| lows[i])
        .filter(|level| *level < price)
        .collect();
    let resistance: Vec<Decimal> = swing_highs(&highs, params.fractal_span)
        .into_iter()
        .map(|i| highs[i])
        .filter(|level| *level > price)
        .collect();

    SupportResistance {
        support: nearest(merge(support, params.merge_tolerance), price, params.max_levels),
        resistance: nearest(merge(resistance, params.merge_tolerance), price, params.max_levels),
    }
}

fn merge(mut levels: Vec<Decimal>, tolerance: Decimal) -> Vec<Decimal> {
    levels.sort();
    let mut clusters: Vec<Vec<Decimal>> = Vec::new();
    for level in levels {
        match clusters.last_mut() {
            Some(cluster) if (level - cluster[0]) / cluster[0] <= tolerance => cluster.push(level),
            _ => clusters.push(vec![level]),
        }
    }
    clusters
        .into_iter()
        .map(|cluster| cluster.iter().sum::<Decimal>() / Decimal::from(cluster.len()))
        .collect()
}

fn nearest(mut levels: Vec<Decimal>, price: Decimal, count: usize) -> Vec<Decimal> {
    levels.sort_by_key(|level| (*level - price).abs());
    levels.truncate(count);
    levels
}
