//! Configuration for the validator.
//!
//! Configured via a TOML file, with support for environment variable
//! interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [schema]
//! files = ["schema/users.json", "${SCHEMA_DIR}/audit.json"]
//!
//! [interceptor]
//! max_body_bytes = 1048576
//!
//! [observability.logging]
//! level = "debug"
//! format = "json"
//! ```

mod interceptor;
mod observability;
mod schema;

use std::path::Path;

pub use interceptor::*;
pub use observability::*;
pub use schema::*;
use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// All sections are optional with defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    /// Schema-tree documents to compile.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Runtime interceptor settings.
    #[serde(default)]
    pub interceptor: InterceptorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl ValidateConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Relative schema paths are resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(e, path.to_path_buf()))?;

        let mut config = Self::from_str(&contents)?;
        if let Some(base) = path.parent() {
            config.schema.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: ValidateConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interceptor.max_body_bytes == 0 {
            return Err(ConfigError::Validation(
                "interceptor.max_body_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Variables after a `#` on the same line are left alone.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };
            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            result.push_str(&line[last_end..whole.start()]);
            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            result.push_str(&value);
            last_end = whole.end();
        }

        result.push_str(&line[last_end..]);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ValidateConfig::from_str("").unwrap();
        assert!(config.schema.files.is_empty());
        assert_eq!(config.interceptor.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.observability.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_full_config() {
        let config = ValidateConfig::from_str(
            r#"
            [schema]
            files = ["users.json", "audit.json"]

            [interceptor]
            max_body_bytes = 4096

            [observability.logging]
            level = "debug"
            format = "json"
            filter = "atlas_validate=trace"
        "#,
        )
        .unwrap();

        assert_eq!(
            config.schema.files,
            vec![PathBuf::from("users.json"), PathBuf::from("audit.json")]
        );
        assert_eq!(config.interceptor.max_body_bytes, 4096);
        assert!(matches!(config.observability.logging.level, LogLevel::Debug));
        assert_eq!(config.observability.logging.format, LogFormat::Json);
        assert_eq!(
            config.observability.logging.filter.as_deref(),
            Some("atlas_validate=trace")
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ValidateConfig::from_str(
            r#"
            [interceptor]
            max_body = 1
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let result = ValidateConfig::from_str(
            r#"
            [interceptor]
            max_body_bytes = 0
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_env_var_expansion() {
        let config = temp_env::with_var(
            "ATLAS_VALIDATE_TEST_SCHEMA",
            Some("/srv/schema.json"),
            || {
                ValidateConfig::from_str(
                    r#"
                    [schema]
                    files = ["${ATLAS_VALIDATE_TEST_SCHEMA}"]
                "#,
                )
            },
        )
        .unwrap();
        assert_eq!(config.schema.files, vec![PathBuf::from("/srv/schema.json")]);
    }

    #[test]
    fn test_missing_env_var() {
        let result = expand_env_vars("files = [\"${ATLAS_VALIDATE_SURELY_UNSET}\"]");
        assert!(matches!(
            result,
            Err(ConfigError::EnvVarNotFound(ref name)) if name == "ATLAS_VALIDATE_SURELY_UNSET"
        ));
    }

    #[test]
    fn test_env_vars_in_comments_are_skipped() {
        let input = "# files = [\"${ATLAS_VALIDATE_SURELY_UNSET}\"]\nlevel = \"info\"";
        assert_eq!(expand_env_vars(input).unwrap(), input);

        let input = "level = \"info\" # see ${ATLAS_VALIDATE_SURELY_UNSET}";
        assert_eq!(expand_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_from_file_resolves_relative_schema_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validate.toml");
        std::fs::write(
            &path,
            "[schema]\nfiles = [\"schema/users.json\", \"/abs/audit.json\"]\n",
        )
        .unwrap();

        let config = ValidateConfig::from_file(&path).unwrap();
        assert_eq!(
            config.schema.files,
            vec![
                dir.path().join("schema/users.json"),
                PathBuf::from("/abs/audit.json")
            ]
        );
    }

    #[test]
    fn test_missing_file() {
        let result = ValidateConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
