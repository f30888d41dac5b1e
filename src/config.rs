//! Tunable limits of a `Codec`.

use tracing::debug;
use crate::error::{ Error, ErrorKind, Result, ResultExt };

/// Default nesting limit. The top-level table counts as level 1.
pub const MAX_DEPTH: usize = 100;

/// Codec settings. Parsed from JSON with every field optional:
/// ```
/// # use tabula::config::CodecConfig;
/// # fn main() -> tabula::error::Result<()> {
/// let config = CodecConfig::from_json_str(r#"{ "max_depth": 8 }"#)?;
///
/// assert_eq!(config.max_depth, 8);
/// assert!(config.validate);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Deepest allowed nesting of tables and documents, inclusive.
    pub max_depth: usize,
    /// Whether built documents are structurally checked before being
    /// handed out.
    pub validate: bool,
}

impl CodecConfig {
    /// Parses and checks a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CodecConfig = serde_json::from_str(json)
            .chain("can't parse codec configuration")?;

        config.check()?;
        Ok(config)
    }

    /// Builder-style setter for `max_depth`.
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        CodecConfig { max_depth, ..self }
    }

    /// Builder-style setter for `validate`.
    pub fn with_validation(self, validate: bool) -> Self {
        CodecConfig { validate, ..self }
    }

    /// Rejects settings no codec could work with.
    pub fn check(&self) -> Result<()> {
        if self.max_depth == 0 {
            Err(Error::new(ErrorKind::Config, "`max_depth` must be at least 1"))
        } else {
            Ok(())
        }
    }

    /// Fails if nesting level `depth` exceeds `max_depth`.
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            debug!(depth, max_depth = self.max_depth, "nesting limit exceeded");
            Err(Error::new(
                ErrorKind::ResourceExhausted,
                "too many levels of nested structures",
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            max_depth: MAX_DEPTH,
            validate: true,
        }
    }
}
