//! 신호 엔진의 도메인 모델.

pub mod accuracy;
pub mod aligned;
pub mod candle;
pub mod recommendation;
pub mod signal;

pub use accuracy::*;
pub use aligned::*;
pub use candle::*;
pub use recommendation::*;
pub use signal::*;
