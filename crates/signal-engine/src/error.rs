//! 엔진 에러 타입 정의.

use signal_core::{SignalError, Symbol};
use thiserror::Error;

/// 시장 데이터 제공자 에러.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// 요청한 데이터가 없음
    #[error("데이터 없음: {0}")]
    NotFound(String),

    /// 파일 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(String),

    /// 파싱 에러
    #[error("파싱 에러 ({source_name} {line}행): {detail}")]
    Parse {
        source_name: String,
        line: u64,
        detail: String,
    },

    /// 기타 에러
    #[error("기타 에러: {0}")]
    Other(String),
}

/// 엔진 에러.
#[derive(Debug, Error)]
pub enum EngineError {
    /// 시장 데이터 제공자 에러
    #[error("시장 데이터 에러: {0}")]
    Provider(#[from] ProviderError),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 심볼 전환으로 취소된 사이클
    #[error("사이클 취소됨: {symbol}")]
    Cancelled { symbol: Symbol },

    /// 신호 계산 에러
    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Result 타입 별칭
pub type EngineResult<T> = std::result::Result<T, EngineError>;
