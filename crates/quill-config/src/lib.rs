use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid import pattern `{pattern}`: {source}")]
    ImportPatternError {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to resolve import pattern `{pattern}`: {source}")]
    ImportGlobError {
        pattern: String,
        source: glob::GlobError,
    },
}

/// What may follow a custom directive's header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveBody {
    #[default]
    None,
    Code,
    Markup,
}

/// Where a custom directive may appear and how often.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveScope {
    #[default]
    Anywhere,
    File,
    FileOnce,
}

/// A directive added to (or replacing one of) the built-in set.
///
/// ```toml
/// [[directives]]
/// name = "layout"
/// tokens = ["type", "string?"]
/// scope = "file-once"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveConfig {
    pub name: String,
    #[serde(default)]
    pub body: DirectiveBody,
    /// Token kinds: `type`, `namespace`, `member` or `string`, with a `?`
    /// suffix when optional.
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub scope: DirectiveScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory templates are scanned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    /// Glob patterns for import files applied to every template, relative
    /// to the config file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default = "default_design_time")]
    pub design_time: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_design_time() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: None,
            root_namespace: None,
            base_type: None,
            imports: Vec::new(),
            design_time: default_design_time(),
            directives: Vec::new(),
            base_dir: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the project root
        config.project_root = config
            .project_root
            .map(|root| Self::expand_path(&root).unwrap_or(root));
        config.base_dir = config_path.parent().map(Path::to_path_buf);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/quill");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Files matched by the `imports` patterns, in pattern order and sorted
    /// within each pattern. A file matched twice is kept once.
    pub fn resolve_imports(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files: Vec<PathBuf> = Vec::new();
        for pattern in &self.imports {
            let expanded = Self::expand_path(Path::new(pattern))
                .unwrap_or_else(|| PathBuf::from(pattern));
            let full = match &self.base_dir {
                Some(base) if expanded.is_relative() => base.join(expanded),
                _ => expanded,
            };
            let full = full.to_string_lossy();

            let entries = glob::glob(&full).map_err(|source| ConfigError::ImportPatternError {
                pattern: pattern.clone(),
                source,
            })?;
            let mut matched = entries
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ConfigError::ImportGlobError {
                    pattern: pattern.clone(),
                    source,
                })?;
            matched.sort();
            for path in matched {
                if path.is_file() && !files.contains(&path) {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/quill/config.toml"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.design_time);
    }

    #[test]
    fn test_full_config_parses() {
        let config_content = r#"
root_namespace = "Shop.Web"
base_type = "Shop.PageBase"
imports = ["shared/*.qtml"]
design_time = false

[[directives]]
name = "layout"
tokens = ["type", "string?"]
scope = "file-once"

[[directives]]
name = "slot"
body = "markup"
tokens = ["member"]
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.root_namespace.as_deref(), Some("Shop.Web"));
        assert_eq!(config.base_type.as_deref(), Some("Shop.PageBase"));
        assert_eq!(config.imports, vec!["shared/*.qtml"]);
        assert!(!config.design_time);
        assert_eq!(
            config.directives,
            vec![
                DirectiveConfig {
                    name: "layout".to_string(),
                    body: DirectiveBody::None,
                    tokens: vec!["type".to_string(), "string?".to_string()],
                    scope: DirectiveScope::FileOnce,
                },
                DirectiveConfig {
                    name: "slot".to_string(),
                    body: DirectiveBody::Markup,
                    tokens: vec!["member".to_string()],
                    scope: DirectiveScope::Anywhere,
                },
            ]
        );
    }

    #[test]
    fn test_unknown_body_kind_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        fs::write(
            &config_file,
            "[[directives]]\nname = \"slot\"\nbody = \"html\"\n",
        )
        .unwrap();

        let error = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(error, ConfigError::ConfigParseError { .. }));
        assert!(error.to_string().contains("config.toml"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_project_root_with_env_var_in_toml() {
        unsafe {
            env::set_var("QUILL_TEST_SITE", "/custom/site");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        fs::write(&config_file, "project_root = \"$QUILL_TEST_SITE/views\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.project_root, Some(PathBuf::from("/custom/site/views")));
        unsafe {
            env::remove_var("QUILL_TEST_SITE");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            root_namespace: Some("Site".to_string()),
            imports: vec!["_Global.qtml".to_string()],
            directives: vec![DirectiveConfig {
                name: "layout".to_string(),
                body: DirectiveBody::None,
                tokens: vec!["type".to_string()],
                scope: DirectiveScope::File,
            }],
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config.root_namespace, test_config.root_namespace);
        assert_eq!(loaded_config.imports, test_config.imports);
        assert_eq!(loaded_config.directives, test_config.directives);
        assert_eq!(loaded_config.design_time, test_config.design_time);
    }

    #[test]
    fn test_imports_resolve_relative_to_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let shared = temp_dir.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("b.qtml"), "@using B\n").unwrap();
        fs::write(shared.join("a.qtml"), "@using A\n").unwrap();
        fs::write(temp_dir.path().join("_Global.qtml"), "@using G\n").unwrap();
        let config_file = temp_dir.path().join("quill.toml");
        fs::write(
            &config_file,
            "imports = [\"_Global.qtml\", \"shared/*.qtml\", \"shared/a.qtml\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let imports = config.resolve_imports().unwrap();

        assert_eq!(
            imports,
            vec![
                temp_dir.path().join("_Global.qtml"),
                shared.join("a.qtml"),
                shared.join("b.qtml"),
            ]
        );
    }

    #[test]
    fn test_invalid_import_pattern() {
        let config = Config {
            imports: vec!["shared/[*.qtml".to_string()],
            ..Config::default()
        };

        let error = config.resolve_imports().unwrap_err();

        assert!(matches!(error, ConfigError::ImportPatternError { .. }));
    }
}
