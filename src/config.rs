// logsleuth-analyzer - config.rs
//
// Ambient export configuration. Nothing about flavor recognition or command
// behaviour is configurable here (those shapes are fixed by the corpora this
// engine understands); this only covers how an embedder wants exported
// output written.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::constants::{DEFAULT_EXPORT_FORMAT, PCAP_SNAPLEN};
use crate::util::error::{ExportError, Result as EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// One of "raw-line", "json-full", "json-single-params".
    pub default_format: String,
    /// Append to an existing export file instead of truncating it.
    pub append: bool,
    /// Snaplen recorded in the PCAP global header for network exports.
    pub pcap_snaplen: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: DEFAULT_EXPORT_FORMAT.to_string(),
            append: false,
            pcap_snaplen: PCAP_SNAPLEN,
        }
    }
}

impl ExportConfig {
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        toml::from_str(text).map_err(|source| {
            ExportError::MalformedEnvelope {
                reason: format!("invalid export config TOML: {source}"),
            }
            .into()
        })
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ExportConfig::default();
        assert_eq!(cfg.default_format, "raw-line");
        assert!(!cfg.append);
    }

    #[test]
    fn parses_partial_toml() {
        let cfg = ExportConfig::from_toml_str("append = true\n").unwrap();
        assert!(cfg.append);
        assert_eq!(cfg.default_format, "raw-line");
    }
}
