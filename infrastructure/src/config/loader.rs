//! Configuration file loader with multi-source merging

use super::error::ConfigError;
use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;
use tracing::debug;

/// Prefix of environment overrides, e.g. `TOOLGATE_HEALTH__FAILURE_THRESHOLD=5`
pub const ENV_PREFIX: &str = "TOOLGATE_";

const PROJECT_FILES: [&str; 2] = ["toolgate.toml", ".toolgate.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOLGATE_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./toolgate.toml` or `./.toolgate.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/toolgate/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigError::NotFound(path.clone()));
        }
        Self::figment(config_path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load and reject configurations with error-level issues
    pub fn load_validated(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        let config = Self::load(config_path)?;
        let errors: Vec<_> = config
            .validate()
            .into_iter()
            .filter(|issue| issue.is_error())
            .collect();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// The merged provider stack, before extraction
    pub fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!(path = %global_path.display(), "Merging global config");
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            debug!(path = %project_path.display(), "Merging project config");
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            debug!(path = %path.display(), "Merging explicit config");
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/toolgate/config.toml`, falling back to the platform config dir
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolgate").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] {}*", ENV_PREFIX);

        if let Some(path) = config_path {
            let marker = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<5}] Explicit: {}", marker, path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND] Project: {}", path.display()),
            None => println!("  [     ] Project: ./toolgate.toml or ./.toolgate.toml"),
        }

        if let Some(path) = Self::global_config_path() {
            let marker = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", marker, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use toolgate_domain::ToolMode;

    fn isolate(jail: &mut Jail) {
        let dir = jail.directory().display().to_string();
        jail.set_env("XDG_CONFIG_HOME", dir);
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.tools.is_empty());
        assert_eq!(config.default_mode(), ToolMode::Auto);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.ends_with("toolgate/config.toml"));
    }

    #[test]
    fn test_project_file_and_env_override() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_file(
                "toolgate.toml",
                r#"
[orchestrator]
tool_mode = "degraded"

[health]
failure_threshold = 4
"#,
            )?;
            jail.set_env("TOOLGATE_HEALTH__FAILURE_THRESHOLD", "9");

            let config = ConfigLoader::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.default_mode(), ToolMode::Degraded);
            assert_eq!(config.health.failure_threshold, 9);
            assert_eq!(config.health.recovery_threshold, 2);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_wins_over_project_file() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_file("toolgate.toml", "[orchestrator]\nwindow_capacity = 10\n")?;
            jail.create_file("custom.toml", "[orchestrator]\nwindow_capacity = 20\n")?;

            let explicit = PathBuf::from("custom.toml");
            let config = ConfigLoader::load(Some(&explicit)).map_err(|e| e.to_string())?;
            assert_eq!(config.orchestrator.window_capacity, 20);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|jail| {
            isolate(jail);
            let missing = PathBuf::from("nope.toml");
            assert!(matches!(
                ConfigLoader::load(Some(&missing)),
                Err(ConfigError::NotFound(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_load_validated_rejects_errors() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_file("toolgate.toml", "[tools.calc]\nmode = \"live\"\n")?;

            match ConfigLoader::load_validated(None) {
                Err(ConfigError::Invalid(issues)) => {
                    assert_eq!(issues[0].field, "tools.calc.live");
                }
                other => panic!("expected invalid config, got {:?}", other.map(|_| ())),
            }
            Ok(())
        });
    }
}
