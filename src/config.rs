//! Loading a [`SearchConfig`] from TOML.
//!
//! Every key is optional. Missing ones take the defaults of the configured
//! `strategy` ([`SearchConfig::for_strategy`]), or the stochastic defaults when
//! no strategy is given. A `[weights]` table overrides single weights on top of
//! those defaults; a `[depth_cap]` table replaces the cap as a whole.
//!
//! ```toml
//! strategy = "adversarial"
//! ordering = "static"
//!
//! [depth_cap]
//! fixed = 6
//!
//! [weights]
//! empty = 80.0
//! empty_curve = "log2"
//! smoothness = 1.5
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use toml::Table;

use crate::error::ConfigError;
use crate::search::{DepthCap, MoveOrder, SearchConfig, Strategy};

/// A config file as written: each key present or not.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Document {
    strategy: Option<Strategy>,
    depth_cap: Option<DepthCap>,
    ordering: Option<MoveOrder>,
    weights: Table,
}

/// Parse and validate a config document.
pub fn parse_config(text: &str) -> Result<SearchConfig, ConfigError> {
    let doc: Document = toml::from_str(text)?;
    let mut config = doc.strategy.map_or_else(SearchConfig::default, SearchConfig::for_strategy);
    if let Some(cap) = doc.depth_cap {
        config.depth_cap = cap;
    }
    if let Some(ordering) = doc.ordering {
        config.ordering = ordering;
    }
    if !doc.weights.is_empty() {
        let mut weights = Table::try_from(config.weights)?;
        for (key, value) in doc.weights {
            weights.insert(key, value);
        }
        config.weights = weights.try_into()?;
    }
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<SearchConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    parse_config(&text)
}
