//! 거래 심볼 정의.
//!
//! 암호화폐 거래쌍(기준 자산/호가 자산)을 나타냅니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `BTCUSDT`처럼 구분자 없는 심볼을 해석할 때 사용하는 호가 자산 목록.
const KNOWN_QUOTES: [&str; 7] = ["USDT", "USDC", "BUSD", "FDUSD", "USD", "BTC", "ETH"];

/// 거래 심볼 (예: BTC/USDT).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC)
    pub base: String,
    /// 호가 자산 (예: USDT)
    pub quote: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().trim().to_uppercase(),
            quote: quote.into().trim().to_uppercase(),
        }
    }

    /// 거래소 형식의 연결된 문자열 (예: BTCUSDT).
    pub fn to_compact(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Symbol {
    type Err = String;

    /// `BTC/USDT`, `BTC-USDT`, `BTCUSDT` 형식을 지원합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if let Some((base, quote)) = s.split_once(['/', '-', '_']) {
            if base.is_empty() || quote.is_empty() {
                return Err(format!("Invalid symbol: {}", s));
            }
            return Ok(Symbol::new(base, quote));
        }

        KNOWN_QUOTES
            .iter()
            .find(|quote| s.len() > quote.len() && s.ends_with(*quote))
            .map(|quote| Symbol::new(&s[..s.len() - quote.len()], *quote))
            .ok_or_else(|| format!("Invalid symbol: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_parsing() {
        let expected = Symbol::new("btc", "usdt");
        assert_eq!("BTC/USDT".parse::<Symbol>().unwrap(), expected);
        assert_eq!("btc-usdt".parse::<Symbol>().unwrap(), expected);
        assert_eq!("BTCUSDT".parse::<Symbol>().unwrap(), expected);
        assert_eq!("ETHBTC".parse::<Symbol>().unwrap(), Symbol::new("ETH", "BTC"));
    }

    #[test]
    fn test_symbol_parsing_rejects_garbage() {
        assert!("USDT".parse::<Symbol>().is_err());
        assert!("/USDT".parse::<Symbol>().is_err());
        assert!("FOOBAR".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("sol", "usdc");
        assert_eq!(symbol.to_string(), "SOL/USDC");
        assert_eq!(symbol.to_compact(), "SOLUSDC");
    }
}
