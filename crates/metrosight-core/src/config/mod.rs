pub mod detection;
pub mod regions;

pub use detection::{DetectionConfig, HueBand};
pub use regions::{ConfigError, RegionConfig, RegionName};

/// Everything a `FrameAnalyzer` needs besides the OCR engine.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub detection: DetectionConfig,
    pub regions: RegionConfig,
}
