//! # Signal Core
//!
//! 다중 타임프레임 신호 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! - 캔들 및 캔들 시계열
//! - 심볼과 타임프레임 (계층 가중치 포함)
//! - 타임프레임 신호, 정렬된 신호 집합, 거래 추천, 정확도 기록
//! - 에러 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
