use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for the Discord bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Register the `/appmonitor` slash command when the bot connects.
    pub register_commands: bool,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("register_commands", &self.register_commands)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            register_commands: true,
        }
    }
}

impl DiscordConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = DiscordConfig::default();
        assert!(!cfg.has_token());
        assert!(cfg.register_commands);
    }

    #[test]
    fn config_parses_partial_json() {
        let json = serde_json::json!({ "token": "Bot MTIzNDU2.example" });
        let cfg: DiscordConfig =
            serde_json::from_value(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(cfg.has_token());
        assert_eq!(cfg.token.expose_secret(), "Bot MTIzNDU2.example");
        assert!(cfg.register_commands);
    }

    #[test]
    fn whitespace_token_counts_as_missing() {
        let cfg = DiscordConfig {
            token: Secret::new("   ".into()),
            ..Default::default()
        };
        assert!(!cfg.has_token());
    }

    #[test]
    fn config_round_trip() {
        let cfg = DiscordConfig {
            token: Secret::new("abc".into()),
            register_commands: false,
        };
        let value = serde_json::to_value(&cfg).unwrap_or_else(|e| panic!("serialize failed: {e}"));
        assert_eq!(value["token"], "abc");
        let back: DiscordConfig =
            serde_json::from_value(value).unwrap_or_else(|e| panic!("re-parse failed: {e}"));
        assert!(!back.register_commands);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = DiscordConfig {
            token: Secret::new("super-secret-bot-token".into()),
            ..Default::default()
        };
        let debug = format!("{cfg:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-bot-token"));
        assert!(debug.contains("register_commands"));
    }
}
