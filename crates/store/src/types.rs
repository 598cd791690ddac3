use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a guild (community server).
    GuildId
);
snowflake_id!(
    /// Identifier of a text channel notifications are posted to.
    ChannelId
);
snowflake_id!(
    /// Identifier of the role mentioned in notifications.
    RoleId
);

/// Notification settings for a single guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: GuildId,

    #[serde(default, rename = "notification_channel")]
    pub notification_channel_id: Option<ChannelId>,

    #[serde(default, rename = "notification_role")]
    pub notification_role_id: Option<RoleId>,

    #[serde(default)]
    pub enabled: bool,
}

impl GuildConfig {
    /// Settings a guild starts with: disabled, nothing configured.
    #[must_use]
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            notification_channel_id: None,
            notification_role_id: None,
            enabled: false,
        }
    }

    /// Channel and role when both are set.
    #[must_use]
    pub fn target(&self) -> Option<(ChannelId, RoleId)> {
        Some((self.notification_channel_id?, self.notification_role_id?))
    }

    /// Whether an event for this guild should produce a notification.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.target().is_some()
    }
}

/// Storage key for a guild's record.
#[must_use]
pub fn storage_key(guild_id: GuildId) -> String {
    format!("guild-{guild_id}")
}
