use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::rect::NormalizedRect;

/// Named screen areas the analyzer reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionName {
    Score,
    TrainCount,
    TunnelCount,
    LineIndicator,
    Map,
    WagonCount,
}

impl RegionName {
    pub const ALL: [RegionName; 6] = [
        RegionName::Score,
        RegionName::TrainCount,
        RegionName::TunnelCount,
        RegionName::LineIndicator,
        RegionName::Map,
        RegionName::WagonCount,
    ];

    /// Region used when the store has no entry for this name.
    pub fn default_rect(self) -> NormalizedRect {
        match self {
            RegionName::Score => NormalizedRect::new(0.80, 0.00, 0.18, 0.10),
            RegionName::TrainCount => NormalizedRect::new(0.10, 0.85, 0.20, 0.10),
            RegionName::TunnelCount => NormalizedRect::new(0.70, 0.85, 0.20, 0.10),
            RegionName::LineIndicator => NormalizedRect::new(0.35, 0.85, 0.30, 0.10),
            RegionName::Map => NormalizedRect::new(0.00, 0.00, 1.00, 0.80),
            RegionName::WagonCount => NormalizedRect::new(0.10, 0.75, 0.20, 0.10),
        }
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionName::Score => "score",
            RegionName::TrainCount => "train-count",
            RegionName::TunnelCount => "tunnel-count",
            RegionName::LineIndicator => "line-indicator",
            RegionName::Map => "map",
            RegionName::WagonCount => "wagon-count",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read region config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed region config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Flat mapping from region name to `[x, y, w, h]` fractions.
///
/// Accepts both the short names and the legacy `*_region` keys written by
/// the calibration tool. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    #[serde(default, alias = "score_region", skip_serializing_if = "Option::is_none")]
    pub score: Option<NormalizedRect>,
    #[serde(
        default,
        rename = "train-count",
        alias = "train_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub train_count: Option<NormalizedRect>,
    #[serde(
        default,
        rename = "tunnel-count",
        alias = "tunnel_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub tunnel_count: Option<NormalizedRect>,
    #[serde(
        default,
        rename = "line-indicator",
        alias = "lines_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_indicator: Option<NormalizedRect>,
    #[serde(
        default,
        alias = "station_map_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub map: Option<NormalizedRect>,
    #[serde(
        default,
        rename = "wagon-count",
        alias = "wagon_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub wagon_count: Option<NormalizedRect>,
}

impl RegionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RegionConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(?path, configured = config.configured_count(), "region config loaded");
        Ok(config)
    }

    pub fn get(&self, name: RegionName) -> Option<NormalizedRect> {
        match name {
            RegionName::Score => self.score,
            RegionName::TrainCount => self.train_count,
            RegionName::TunnelCount => self.tunnel_count,
            RegionName::LineIndicator => self.line_indicator,
            RegionName::Map => self.map,
            RegionName::WagonCount => self.wagon_count,
        }
    }

    pub fn set(&mut self, name: RegionName, rect: NormalizedRect) {
        let slot = match name {
            RegionName::Score => &mut self.score,
            RegionName::TrainCount => &mut self.train_count,
            RegionName::TunnelCount => &mut self.tunnel_count,
            RegionName::LineIndicator => &mut self.line_indicator,
            RegionName::Map => &mut self.map,
            RegionName::WagonCount => &mut self.wagon_count,
        };
        *slot = Some(rect);
    }

    /// The configured region, or its default when unset.
    pub fn resolve(&self, name: RegionName) -> NormalizedRect {
        self.get(name).unwrap_or_else(|| name.default_rect())
    }

    fn configured_count(&self) -> usize {
        RegionName::ALL
            .iter()
            .filter(|&&n| self.get(n).is_some())
            .count()
    }
}
