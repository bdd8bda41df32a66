pub mod generator;
pub mod stats;

pub use generator::generate_report;
pub use stats::{calculate_stats, TaskStats};
