//! Suggestion generation: mapping, conflict resolution and ranking.

pub mod engine;
pub mod mapping;
pub mod prioritizer;
pub mod rules;

pub use engine::generate_suggestions;
pub use prioritizer::{priority_score, sort_suggestions};
pub use rules::{execution_rank, resolve_exclusions, sort_by_execution_order};
