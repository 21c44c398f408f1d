//! 다중 타임프레임 신호 엔진 서비스.
//!
//! 이 crate는 분석 코어를 주기적으로 실행하고 결과를 제공합니다:
//! - 시장 데이터 제공자 (CSV 디렉토리, 메모리)
//! - 심볼별 재계산 사이클 (동시 실행 방지, 트리거 정책, 취소)
//! - 정렬 신호 집합, 거래 추천, 적중률 조회
//! - 변경 이벤트 broadcast

pub mod error;
pub mod events;
pub mod provider;
pub mod scheduler;
pub mod service;
pub mod state;

pub use error::{EngineError, EngineResult, ProviderError};
pub use events::{changed_timeframes, SignalEvent, Trigger};
pub use provider::{CsvMarketData, InMemoryMarketData, MarketDataProvider};
pub use scheduler::{CycleOutcome, CycleRunner};
pub use service::SignalService;
pub use state::{Snapshot, SymbolState};
