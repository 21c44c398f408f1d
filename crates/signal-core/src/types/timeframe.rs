//! 캔들스틱 데이터를 위한 타임프레임 정의.
//!
//! 각 타임프레임은 고정된 계층 가중치(hierarchy weight)를 가집니다.
//! 더 긴 타임프레임일수록 가중치가 높으며, 다중 타임프레임 정렬 시
//! 상충하는 신호를 중재하는 기준이 됩니다.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 캔들스틱 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1분봉
    #[serde(rename = "1m")]
    M1,
    /// 3분봉
    #[serde(rename = "3m")]
    M3,
    /// 5분봉
    #[serde(rename = "5m")]
    M5,
    /// 15분봉
    #[serde(rename = "15m")]
    M15,
    /// 30분봉
    #[serde(rename = "30m")]
    M30,
    /// 1시간봉
    #[serde(rename = "1h")]
    H1,
    /// 2시간봉
    #[serde(rename = "2h")]
    H2,
    /// 4시간봉
    #[serde(rename = "4h")]
    H4,
    /// 6시간봉
    #[serde(rename = "6h")]
    H6,
    /// 8시간봉
    #[serde(rename = "8h")]
    H8,
    /// 12시간봉
    #[serde(rename = "12h")]
    H12,
    /// 일봉
    #[serde(rename = "1d")]
    D1,
    /// 3일봉
    #[serde(rename = "3d")]
    D3,
    /// 주봉
    #[serde(rename = "1w")]
    W1,
    /// 월봉
    #[serde(rename = "1M")]
    MN1,
}

impl Timeframe {
    /// 지원하는 전체 타임프레임 (짧은 것부터).
    pub const ALL: [Timeframe; 15] = [
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H6,
        Timeframe::H8,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::D3,
        Timeframe::W1,
        Timeframe::MN1,
    ];

    /// 이 타임프레임의 기간을 반환합니다.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::from_secs(60),
            Timeframe::M3 => Duration::from_secs(3 * 60),
            Timeframe::M5 => Duration::from_secs(5 * 60),
            Timeframe::M15 => Duration::from_secs(15 * 60),
            Timeframe::M30 => Duration::from_secs(30 * 60),
            Timeframe::H1 => Duration::from_secs(60 * 60),
            Timeframe::H2 => Duration::from_secs(2 * 60 * 60),
            Timeframe::H4 => Duration::from_secs(4 * 60 * 60),
            Timeframe::H6 => Duration::from_secs(6 * 60 * 60),
            Timeframe::H8 => Duration::from_secs(8 * 60 * 60),
            Timeframe::H12 => Duration::from_secs(12 * 60 * 60),
            Timeframe::D1 => Duration::from_secs(24 * 60 * 60),
            Timeframe::D3 => Duration::from_secs(3 * 24 * 60 * 60),
            Timeframe::W1 => Duration::from_secs(7 * 24 * 60 * 60),
            Timeframe::MN1 => Duration::from_secs(30 * 24 * 60 * 60), // 근사값
        }
    }

    /// 기간을 chrono Duration으로 반환합니다.
    pub fn chrono_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.as_secs() as i64)
    }

    /// 캔들 `candles`개에 해당하는 기간. 표현 범위를 넘으면 `None`.
    pub fn span(&self, candles: u32) -> Option<chrono::Duration> {
        let secs = (self.as_secs() as i64).checked_mul(i64::from(candles))?;
        chrono::Duration::try_seconds(secs)
    }

    /// 이 타임프레임의 초 단위 값을 반환합니다.
    pub fn as_secs(&self) -> u64 {
        self.duration().as_secs()
    }

    /// 계층 가중치 (1m = 1 ... 1M = 15).
    ///
    /// 가중치 차이는 정렬 단계에서 페널티 크기를 결정합니다.
    pub fn hierarchy_weight(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M3 => 2,
            Timeframe::M5 => 3,
            Timeframe::M15 => 4,
            Timeframe::M30 => 5,
            Timeframe::H1 => 6,
            Timeframe::H2 => 7,
            Timeframe::H4 => 8,
            Timeframe::H6 => 9,
            Timeframe::H8 => 10,
            Timeframe::H12 => 11,
            Timeframe::D1 => 12,
            Timeframe::D3 => 13,
            Timeframe::W1 => 14,
            Timeframe::MN1 => 15,
        }
    }

    /// 간격 문자열로 변환합니다 (예: "15m", "1d").
    pub fn as_interval(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H8 => "8h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::D3 => "3d",
            Timeframe::W1 => "1w",
            Timeframe::MN1 => "1M",
        }
    }

    /// 간격 문자열에서 파싱합니다.
    pub fn from_interval(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tf| tf.as_interval() == s)
    }

    /// 가중치 내림차순으로 정렬된 사본을 반환합니다.
    pub fn sorted_by_weight_desc(timeframes: &[Timeframe]) -> Vec<Timeframe> {
        let mut sorted = timeframes.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        sorted.dedup();
        sorted
    }
}

impl PartialOrd for Timeframe {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 계층 가중치 순서 (짧은 타임프레임 < 긴 타임프레임).
impl Ord for Timeframe {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hierarchy_weight().cmp(&other.hierarchy_weight())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_interval())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_interval(s.trim()).ok_or_else(|| format!("Invalid timeframe: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::M1.as_secs(), 60);
        assert_eq!(Timeframe::H1.as_secs(), 3600);
        assert_eq!(Timeframe::D1.as_secs(), 86400);
    }

    #[test]
    fn test_span() {
        assert_eq!(Timeframe::H1.span(3), Some(chrono::Duration::hours(3)));
        assert_eq!(Timeframe::W1.span(0), Some(chrono::Duration::zero()));
        assert!(Timeframe::MN1.span(u32::MAX).is_none());
    }

    #[test]
    fn test_interval_round_trip() {
        assert_eq!(Timeframe::M15.as_interval(), "15m");
        assert_eq!(Timeframe::from_interval("4h"), Some(Timeframe::H4));
        assert_eq!("1M".parse::<Timeframe>().unwrap(), Timeframe::MN1);
        assert!("2w".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_hierarchy_weight_follows_duration() {
        for pair in Timeframe::ALL.windows(2) {
            assert!(pair[0].hierarchy_weight() < pair[1].hierarchy_weight());
            assert!(pair[0].duration() < pair[1].duration());
        }
    }

    #[test]
    fn test_sorted_by_weight_desc() {
        let sorted =
            Timeframe::sorted_by_weight_desc(&[Timeframe::M15, Timeframe::W1, Timeframe::D1, Timeframe::M15]);
        assert_eq!(sorted, vec![Timeframe::W1, Timeframe::D1, Timeframe::M15]);
    }

    #[test]
    fn test_serde_uses_interval_names() {
        let json = serde_json::to_string(&Timeframe::H4).unwrap();
        assert_eq!(json, "\"4h\"");
        let parsed: Timeframe = serde_json::from_str("\"1w\"").unwrap();
        assert_eq!(parsed, Timeframe::W1);
    }
}
