//! 신뢰도 및 정확도 점수.
//!
//! - [`ConfidenceScorer`]: 지표 투표를 방향과 신뢰도(0 ~ 100)로 환산
//! - [`AccuracyTracker`]: 방향성 신호의 사후 적중 여부를 기록하고 적중률 계산

pub mod accuracy;
pub mod confidence;

pub use accuracy::AccuracyTracker;
pub use confidence::{ConfidenceScorer, ScoredVote, VoteTally};
