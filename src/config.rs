use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::inference::ArtifactSource;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub model_source: ArtifactSource,
    pub upload_dir: PathBuf,
    pub route_prefix: String,
    pub preload_model: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT", raw))?,
            None => 8080,
        };

        let preload_model = match lookup("PRELOAD_MODEL").as_deref() {
            None | Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue("PRELOAD_MODEL", other.to_string()))
            }
        };

        let route_prefix = lookup("ROUTE_PREFIX").unwrap_or_else(|| "/skin".to_string());
        if !route_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue("ROUTE_PREFIX", route_prefix));
        }

        Ok(Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            model_source: ArtifactSource::parse(
                &lookup("MODEL_SOURCE").unwrap_or_else(|| "model.onnx".to_string()),
            ),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            route_prefix: route_prefix.trim_end_matches('/').to_string(),
            preload_model,
        })
    }
}
