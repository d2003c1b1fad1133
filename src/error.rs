use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot encode config defaults: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("weight `{name}` must be finite, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("depth cap must be at least 1")]
    ZeroDepthCap,
}
