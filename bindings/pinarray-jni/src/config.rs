///
/// # Binding Configuration
///
/// Maps each `ExceptionKind` to the JVM class thrown for it. Every key is
/// optional and falls back to the matching `java.lang` class.
///
/// ## Example
///
/// ```toml
/// [exceptions]
/// illegal_argument = "io/realm/exceptions/RealmIllegalArgumentException"
/// fatal = "io/realm/exceptions/RealmError"
/// ```
///
/// Class names use the JNI binary form (`java/lang/Error`), which is what
/// `FindClass` expects; dotted names are rejected on load.
///

use std::path::{Path, PathBuf};

use pinarray_core::ExceptionKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file loaded by the exported natives
pub const CONFIG_ENV_VAR: &str = "PINARRAY_JNI_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exception class '{name}' for {kind}: {reason}")]
    InvalidClassName {
        kind: ExceptionKind,
        name: String,
        reason: &'static str,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BindingConfig {
    pub exceptions: ExceptionClasses,
}

impl BindingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BindingConfig = toml::from_str(content)?;
        config.exceptions.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExceptionClasses {
    pub illegal_argument: String,
    pub illegal_state: String,
    pub unsupported_operation: String,
    pub out_of_memory: String,
    pub runtime: String,
    pub fatal: String,
}

impl Default for ExceptionClasses {
    fn default() -> Self {
        Self {
            illegal_argument: "java/lang/IllegalArgumentException".to_string(),
            illegal_state: "java/lang/IllegalStateException".to_string(),
            unsupported_operation: "java/lang/UnsupportedOperationException".to_string(),
            out_of_memory: "java/lang/OutOfMemoryError".to_string(),
            runtime: "java/lang/RuntimeException".to_string(),
            fatal: "java/lang/Error".to_string(),
        }
    }
}

impl ExceptionClasses {
    pub fn class_for(&self, kind: ExceptionKind) -> &str {
        match kind {
            ExceptionKind::IllegalArgument => &self.illegal_argument,
            ExceptionKind::IllegalState => &self.illegal_state,
            ExceptionKind::UnsupportedOperation => &self.unsupported_operation,
            ExceptionKind::OutOfMemory => &self.out_of_memory,
            ExceptionKind::Runtime => &self.runtime,
            ExceptionKind::Fatal => &self.fatal,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ExceptionKind::ALL {
            let name = self.class_for(kind);
            let reason = if name.is_empty() {
                Some("class name is empty")
            } else if name.contains('.') {
                Some("use '/' as the package separator")
            } else if name.contains('\0') {
                Some("class name contains a NUL byte")
            } else if name.starts_with('/') || name.ends_with('/') {
                Some("class name has a leading or trailing '/'")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(ConfigError::InvalidClassName {
                    kind,
                    name: name.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }
}
