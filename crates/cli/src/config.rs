use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    appmonitor_discord::DiscordConfig,
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "appmonitor.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMonitorConfig {
    pub discord: DiscordConfig,
    pub storage: StorageConfig,
}

/// Where guild settings are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per guild.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl AppMonitorConfig {
    /// Read the TOML file at `path`. A missing file yields defaults unless
    /// `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply command-line and environment overrides on top of the file.
    pub fn with_overrides(mut self, token: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.discord.token = Secret::new(token);
        }
        if let Some(dir) = data_dir {
            self.storage.data_dir = dir;
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AppMonitorConfig::parse("").unwrap();
        assert!(!cfg.discord.has_token());
        assert!(cfg.discord.register_commands);
        assert_eq!(cfg.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn parses_full_file() {
        let cfg = AppMonitorConfig::parse(
            r#"
            [discord]
            token = "Bot abc"
            register_commands = false

            [storage]
            data_dir = "/var/lib/appmonitor"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.discord.token.expose_secret(), "Bot abc");
        assert!(!cfg.discord.register_commands);
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/var/lib/appmonitor"));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(AppMonitorConfig::parse("[discord\ntoken = 1").is_err());
    }

    #[test]
    fn overrides_win_over_file() {
        let cfg = AppMonitorConfig::parse("[discord]\ntoken = \"from-file\"")
            .unwrap()
            .with_overrides(Some("from-env".into()), Some(PathBuf::from("/tmp/x")));
        assert_eq!(cfg.discord.token.expose_secret(), "from-env");
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn blank_token_override_is_ignored() {
        let cfg = AppMonitorConfig::parse("[discord]\ntoken = \"from-file\"")
            .unwrap()
            .with_overrides(Some("  ".into()), None);
        assert_eq!(cfg.discord.token.expose_secret(), "from-file");
    }

    #[test]
    fn missing_optional_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppMonitorConfig::load(&dir.path().join("nope.toml"), false).unwrap();
        assert_eq!(cfg.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn missing_required_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppMonitorConfig::load(&dir.path().join("nope.toml"), true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[storage]\ndata_dir = \"guilds\"\n").unwrap();
        let cfg = AppMonitorConfig::load(&path, true).unwrap();
        assert_eq!(cfg.storage.data_dir, PathBuf::from("guilds"));
    }

    #[test]
    fn debug_never_prints_token() {
        let cfg = AppMonitorConfig::default().with_overrides(Some("very-secret".into()), None);
        assert!(!format!("{cfg:?}").contains("very-secret"));
    }
}
