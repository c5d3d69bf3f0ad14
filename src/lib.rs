// vulnscan-core
// 扫描引擎核心库：检测器、编排器、工作池、结果缓存与内存治理

mod cache;
mod config;
mod detector;
mod loader;
mod memory;
mod model;
mod pool;
mod scanner;

// 重新导出常用类型
pub use cache::ResultCache;
pub use config::{Config, ScannerConfig};
pub use detector::javascript::JavaScriptDetector;
pub use detector::python::PythonDetector;
pub use detector::Detector;
pub use loader::{load_signatures_from_dir, load_signatures_from_file};
pub use memory::MemoryGovernor;
pub use model::{Match, Severity, Signature, Summary};
pub use pool::WorkerPool;
pub use scanner::{Scanner, DEFAULT_CONFIDENCE_THRESHOLD};

pub mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ScanError {
        #[error("target does not exist: {0}")]
        TargetNotFound(PathBuf),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("walk error: {0}")]
        Walk(#[from] walkdir::Error),

        #[error("worker pool is stopped")]
        PoolStopped,
    }

    pub type Result<T> = std::result::Result<T, ScanError>;
}
