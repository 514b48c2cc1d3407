//! Data directory and `config.toml` loading.
//!
//! The config file is optional. A missing file, an unreadable one, or one
//! that fails to parse all yield [`GlobalConfig::default()`]; only the last
//! two are worth a warning.

use std::path::{Path, PathBuf};

use mnemos_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MNEMOS_DATA_DIR";

const CONFIG_FILE: &str = "config.toml";

/// `$MNEMOS_DATA_DIR`, else `~/.mnemos`, else `./.mnemos`.
///
/// The home directory comes from `dirs::home_dir`, which consults the
/// system user database when `$HOME` is unset.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    default_data_dir(dirs::home_dir())
}

fn default_data_dir(home: Option<PathBuf>) -> PathBuf {
    home.unwrap_or_else(|| PathBuf::from(".")).join(".mnemos")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load `{data_dir}/config.toml`, never failing.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let path = config_path(data_dir);

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Unreadable config file, using defaults");
            return GlobalConfig::default();
        }
    };

    parse_config(&raw).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "Malformed config file, using defaults");
        GlobalConfig::default()
    })
}

/// Parse config text. Absent sections and keys take their defaults.
pub fn parse_config(raw: &str) -> Result<GlobalConfig, toml::de::Error> {
    toml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_global_config(dir.path()).await;
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.memory.db_type, "sqlite");
    }

    #[tokio::test]
    async fn test_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            config_path(dir.path()),
            "[llm]\nbase_url = \"http://localhost:11434/v1\"\nmax_attempts = 2\n\n[memory]\nindex_name = \"notes\"\n",
        )
        .await
        .unwrap();

        let config = load_global_config(dir.path()).await;
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.max_attempts, 2);
        assert_eq!(config.llm.transcription_model, "whisper-1");
        assert_eq!(config.memory.index_name.as_deref(), Some("notes"));
        assert_eq!(config.memory.default_fetch_limit, 5);
    }

    #[tokio::test]
    async fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(config_path(dir.path()), "[llm\nmodel = ")
            .await
            .unwrap();

        let config = load_global_config(dir.path()).await;
        assert_eq!(config.llm.initial_backoff_ms, 500);
    }

    #[test]
    fn test_parse_config_rejects_wrong_types() {
        assert!(parse_config("[memory]\ndefault_fetch_limit = \"many\"\n").is_err());
        assert!(parse_config("").is_ok());
    }

    #[test]
    fn test_default_data_dir_prefers_home() {
        assert_eq!(
            default_data_dir(Some(PathBuf::from("/home/ada"))),
            PathBuf::from("/home/ada/.mnemos")
        );
        assert_eq!(default_data_dir(None), PathBuf::from("./.mnemos"));
    }

    #[test]
    fn test_data_dir_resolves_a_home_directory() {
        if let (None, Some(home)) = (std::env::var_os(DATA_DIR_ENV), dirs::home_dir()) {
            assert_eq!(data_dir(), home.join(".mnemos"));
        }
    }

    #[test]
    fn test_config_path_joins_file_name() {
        assert_eq!(
            config_path(Path::new("/srv/mnemos")),
            PathBuf::from("/srv/mnemos/config.toml")
        );
    }
}
