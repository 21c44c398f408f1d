//! 신호 엔진의 에러 타입.
//!
//! 하나의 (심볼, 타임프레임) 계산에서 발생하는 에러를 정의합니다.
//! 에러는 해당 타임프레임에 국한되며, 정렬 단계에서 `NoData` 항목으로 변환됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// 신호 계산 에러.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// 데이터 부족
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 캔들
    #[error("잘못된 캔들 (인덱스 {index}): {reason}")]
    InvalidCandle { index: usize, reason: String },

    /// 손절가가 진입가와 같거나 반대편에 있음
    #[error("리스크 거리가 유효하지 않습니다: 진입가 {entry}, 손절가 {stop}")]
    DegenerateRisk { entry: Decimal, stop: Decimal },

    /// 오래된 데이터
    #[error("데이터가 오래되었습니다: 마지막 캔들 {last_candle}, 허용 기준 {threshold}")]
    StaleData {
        last_candle: DateTime<Utc>,
        threshold: DateTime<Utc>,
    },

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 신호 계산 Result 타입.
pub type SignalResult<T> = Result<T, SignalError>;

impl SignalError {
    /// 다음 사이클에서 데이터가 보강되면 해소될 수 있는 에러인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SignalError::InsufficientData { .. } | SignalError::StaleData { .. }
        )
    }
}

impl From<config::ConfigError> for SignalError {
    fn from(err: config::ConfigError) -> Self {
        SignalError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_transient() {
        let err = SignalError::InsufficientData {
            required: 50,
            provided: 10,
        };
        assert!(err.is_transient());

        let err = SignalError::DegenerateRisk {
            entry: dec!(100),
            stop: dec!(100),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_error_message() {
        let err = SignalError::InsufficientData {
            required: 20,
            provided: 19,
        };
        assert_eq!(err.to_string(), "데이터가 부족합니다: 필요 20개, 제공 19개");
    }
}
