pub mod analysis;
pub mod cache;
pub mod history;

pub use analysis::{AnalysisEngine, EngineStats};
pub use cache::{Cache, Clock, SystemClock};
pub use history::HistoryProvider;
