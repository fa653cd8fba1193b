//! 批处理模块：基于游标的可恢复主题映射
pub mod progress;
pub mod runner;
pub mod driver;

pub use self::progress::{BatchPhase, BatchProgress, BatchRequest, BatchStatus, format_eta};
pub use self::runner::BatchRunner;
pub use self::driver::{BatchDriver, DriveError, DriveSummary};
