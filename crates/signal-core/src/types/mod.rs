//! 공통 기본 타입.

pub mod symbol;
pub mod timeframe;

pub use symbol::*;
pub use timeframe::*;
