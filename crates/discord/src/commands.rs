//! The `/appmonitor` slash command.
//!
//! Registered globally as a guild-only command restricted to members with
//! Manage Server. Interaction options are parsed into [`AppMonitorCommand`]
//! and executed against the [`ConfigStore`].

use {
    serenity::all::{
        ChannelType, Command, CommandDataOption, CommandDataOptionValue, CommandInteraction,
        CommandOptionType, Context, CreateAllowedMentions, CreateCommand, CreateCommandOption,
        CreateInteractionResponse, CreateInteractionResponseMessage, Interaction, Permissions,
    },
    tracing::{debug, info, warn},
};

use appmonitor_store::{ChannelId, ConfigStore, GuildConfig, GuildId, RoleId};

pub const COMMAND_NAME: &str = "appmonitor";

const STORAGE_FAILURE_MSG: &str = "Could not update settings: storage unavailable.";
const SETTINGS_UNAVAILABLE_MSG: &str = "Could not read settings: storage unavailable.";

/// A parsed `/appmonitor` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMonitorCommand {
    /// Set (`Some`) or clear (`None`) the notification channel.
    Channel(Option<ChannelId>),
    /// Set (`Some`) or clear (`None`) the mention role.
    Role(Option<RoleId>),
    Toggle,
    Settings,
}

impl AppMonitorCommand {
    /// Build from a subcommand name and its optional snowflake argument.
    pub fn from_parts(subcommand: &str, target: Option<u64>) -> Option<Self> {
        match subcommand {
            "channel" => Some(Self::Channel(target.map(ChannelId))),
            "role" => Some(Self::Role(target.map(RoleId))),
            "toggle" => Some(Self::Toggle),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}

/// Build the set of global slash commands to register.
pub fn build_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(COMMAND_NAME)
            .description("Configure membership application notifications")
            .dm_permission(false)
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "channel",
                    "Set the notification channel, or clear it when omitted",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Channel,
                        "channel",
                        "Text channel for application alerts",
                    )
                    .channel_types(vec![ChannelType::Text])
                    .required(false),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "role",
                    "Set the role to notify, or clear it when omitted",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Role,
                        "role",
                        "Role mentioned in application alerts",
                    )
                    .required(false),
                ),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "toggle",
                "Enable or disable application monitoring",
            ))
            .add_option(CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "settings",
                "Show current application monitoring settings",
            )),
    ]
}

/// Register global slash commands for the bot.
pub async fn register_global_commands(ctx: &Context) {
    match Command::set_global_commands(&ctx, build_commands()).await {
        Ok(commands) => {
            let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
            info!(
                commands = ?names,
                "Registered {} Discord slash commands",
                commands.len()
            );
        },
        Err(e) => {
            warn!("Failed to register Discord slash commands: {e}");
        },
    }
}

/// Extract the invocation from raw interaction options. An invocation without
/// a subcommand shows the settings.
pub fn parse_options(options: &[CommandDataOption]) -> Option<AppMonitorCommand> {
    let Some(sub) = options.first() else {
        return Some(AppMonitorCommand::Settings);
    };
    let CommandDataOptionValue::SubCommand(args) = &sub.value else {
        return None;
    };
    let target = args.iter().find_map(|arg| match arg.value {
        CommandDataOptionValue::Channel(id) => Some(id.get()),
        CommandDataOptionValue::Role(id) => Some(id.get()),
        _ => None,
    });
    AppMonitorCommand::from_parts(&sub.name, target)
}

/// Run a command and produce the reply text. Storage failures become a
/// user-facing message rather than an error.
pub async fn execute(
    store: &ConfigStore,
    guild_id: GuildId,
    guild_name: &str,
    command: AppMonitorCommand,
) -> String {
    let result = match command {
        AppMonitorCommand::Channel(channel) => {
            store.set_channel(guild_id, channel).await.map(|_| match channel {
                Some(id) => format!("Notification channel set to <#{id}>"),
                None => "Notification channel has been cleared.".to_string(),
            })
        },
        AppMonitorCommand::Role(role) => store.set_role(guild_id, role).await.map(|_| match role {
            Some(id) => format!("Notification role set to <@&{id}>"),
            None => "Notification role has been cleared.".to_string(),
        }),
        AppMonitorCommand::Toggle => store.toggle(guild_id).await.map(|enabled| {
            let status = if enabled {
                "enabled"
            } else {
                "disabled"
            };
            format!("Application monitoring has been {status}.")
        }),
        AppMonitorCommand::Settings => store
            .snapshot(guild_id)
            .await
            .map(|cfg| render_settings(guild_name, &cfg)),
    };

    match result {
        Ok(text) => {
            info!(%guild_id, ?command, "application monitor command applied");
            text
        },
        Err(e) => {
            warn!(%guild_id, ?command, "application monitor command failed: {e}");
            match command {
                AppMonitorCommand::Settings => SETTINGS_UNAVAILABLE_MSG,
                _ => STORAGE_FAILURE_MSG,
            }
            .to_string()
        },
    }
}

/// Human-readable summary of a guild's settings.
pub fn render_settings(guild_name: &str, cfg: &GuildConfig) -> String {
    let status = if cfg.enabled {
        "Enabled"
    } else {
        "Disabled"
    };
    let channel = cfg
        .notification_channel_id
        .map_or_else(|| "Not Set".to_string(), |id| format!("<#{id}>"));
    let role = cfg
        .notification_role_id
        .map_or_else(|| "Not Set".to_string(), |id| format!("<@&{id}>"));
    format!(
        "**Application Monitor Settings for {guild_name}**\n\
         Status: {status}\n\
         Notification Channel: {channel}\n\
         Notification Role: {role}"
    )
}

/// Handle an incoming interaction for the `/appmonitor` command.
pub async fn handle_interaction(ctx: &Context, interaction: &Interaction, store: &ConfigStore) {
    let Interaction::Command(command) = interaction else {
        return;
    };
    if command.data.name != COMMAND_NAME {
        return;
    }

    debug!(
        command = %command.data.name,
        user = %command.user.name,
        "Discord slash command received"
    );

    let Some(guild) = command.guild_id else {
        respond_ephemeral(ctx, command, "This command only works in a server.").await;
        return;
    };
    let Some(parsed) = parse_options(&command.data.options) else {
        respond_ephemeral(ctx, command, "Unknown subcommand.").await;
        return;
    };

    let guild_name = guild
        .name(ctx)
        .unwrap_or_else(|| "this server".to_string());
    let reply = execute(store, GuildId(guild.get()), &guild_name, parsed).await;
    respond_ephemeral(ctx, command, &reply).await;
}

/// Reply visible only to the invoker, with mentions rendered but not pinged.
async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, text: &str) {
    let message = CreateInteractionResponseMessage::new()
        .content(text)
        .ephemeral(true)
        .allowed_mentions(CreateAllowedMentions::new());
    if let Err(e) = command
        .create_response(&ctx, CreateInteractionResponse::Message(message))
        .await
    {
        warn!(
            command = %command.data.name,
            "Failed to respond to slash command: {e}"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {
        super::*,
        appmonitor_store::{MemoryStorage, Storage},
        async_trait::async_trait,
        std::sync::Arc,
    };

    fn store() -> ConfigStore {
        ConfigStore::new(Arc::new(MemoryStorage::new()))
    }

    struct OfflineStorage;

    #[async_trait]
    impl Storage for OfflineStorage {
        async fn load(&self, _key: &str) -> appmonitor_store::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn save(&self, _key: &str, _bytes: &[u8]) -> appmonitor_store::Result<()> {
            Err(std::io::Error::other("read-only").into())
        }

        async fn delete(&self, _key: &str) -> appmonitor_store::Result<()> {
            Err(std::io::Error::other("read-only").into())
        }
    }

    #[test]
    fn from_parts_maps_subcommands() {
        assert_eq!(
            AppMonitorCommand::from_parts("channel", Some(5)),
            Some(AppMonitorCommand::Channel(Some(ChannelId(5))))
        );
        assert_eq!(
            AppMonitorCommand::from_parts("channel", None),
            Some(AppMonitorCommand::Channel(None))
        );
        assert_eq!(
            AppMonitorCommand::from_parts("role", Some(6)),
            Some(AppMonitorCommand::Role(Some(RoleId(6))))
        );
        assert_eq!(
            AppMonitorCommand::from_parts("toggle", None),
            Some(AppMonitorCommand::Toggle)
        );
        assert_eq!(
            AppMonitorCommand::from_parts("settings", None),
            Some(AppMonitorCommand::Settings)
        );
        assert_eq!(AppMonitorCommand::from_parts("purge", None), None);
    }

    #[test]
    fn no_options_shows_settings() {
        assert_eq!(parse_options(&[]), Some(AppMonitorCommand::Settings));
    }

    #[test]
    fn build_commands_serializes_to_valid_json() {
        let commands = build_commands();
        assert_eq!(commands.len(), 1);
        let json = serde_json::to_value(&commands[0])
            .unwrap_or_else(|e| panic!("failed to serialize command: {e}"));
        assert_eq!(json["name"], COMMAND_NAME);
        assert_eq!(
            json["default_member_permissions"],
            Permissions::MANAGE_GUILD.bits().to_string()
        );

        let subcommands: Vec<&str> = json["options"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|o| o["name"].as_str())
            .collect();
        assert_eq!(subcommands, vec!["channel", "role", "toggle", "settings"]);
    }

    #[test]
    fn descriptions_within_discord_limit() {
        // Discord enforces a 100-character limit on descriptions.
        let json = serde_json::to_value(&build_commands()[0]).unwrap();
        let desc = json["description"].as_str().unwrap_or_default();
        assert!(!desc.is_empty() && desc.len() <= 100);
        for option in json["options"].as_array().unwrap() {
            let desc = option["description"].as_str().unwrap_or_default();
            assert!(
                !desc.is_empty() && desc.len() <= 100,
                "option {} description out of range: {desc}",
                option["name"]
            );
        }
    }

    #[test]
    fn settings_render_unset_values() {
        let text = render_settings("Rust Club", &GuildConfig::new(GuildId(1)));
        assert_eq!(
            text,
            "**Application Monitor Settings for Rust Club**\n\
             Status: Disabled\n\
             Notification Channel: Not Set\n\
             Notification Role: Not Set"
        );
    }

    #[test]
    fn settings_render_configured_values() {
        let cfg = GuildConfig {
            notification_channel_id: Some(ChannelId(10)),
            notification_role_id: Some(RoleId(20)),
            enabled: true,
            ..GuildConfig::new(GuildId(1))
        };
        let text = render_settings("Rust Club", &cfg);
        assert!(text.contains("Status: Enabled"));
        assert!(text.contains("Notification Channel: <#10>"));
        assert!(text.contains("Notification Role: <@&20>"));
    }

    #[tokio::test]
    async fn execute_applies_changes_and_replies() {
        let store = store();
        let guild = GuildId(1);

        let reply = execute(
            &store,
            guild,
            "g",
            AppMonitorCommand::Channel(Some(ChannelId(10))),
        )
        .await;
        assert_eq!(reply, "Notification channel set to <#10>");

        let reply = execute(&store, guild, "g", AppMonitorCommand::Role(Some(RoleId(20)))).await;
        assert_eq!(reply, "Notification role set to <@&20>");

        let reply = execute(&store, guild, "g", AppMonitorCommand::Toggle).await;
        assert_eq!(reply, "Application monitoring has been enabled.");

        let cfg = store.get(guild).await.unwrap();
        assert!(cfg.is_active());

        let reply = execute(&store, guild, "g", AppMonitorCommand::Toggle).await;
        assert_eq!(reply, "Application monitoring has been disabled.");
    }

    #[tokio::test]
    async fn execute_clears_values() {
        let store = store();
        let guild = GuildId(1);
        store.set_channel(guild, Some(ChannelId(10))).await.unwrap();
        store.set_role(guild, Some(RoleId(20))).await.unwrap();

        let reply = execute(&store, guild, "g", AppMonitorCommand::Channel(None)).await;
        assert_eq!(reply, "Notification channel has been cleared.");
        let reply = execute(&store, guild, "g", AppMonitorCommand::Role(None)).await;
        assert_eq!(reply, "Notification role has been cleared.");

        let cfg = store.get(guild).await.unwrap();
        assert!(cfg.target().is_none());
    }

    #[tokio::test]
    async fn execute_settings_reads_snapshot() {
        let store = store();
        store.toggle(GuildId(1)).await.unwrap();
        let reply = execute(&store, GuildId(1), "Rust Club", AppMonitorCommand::Settings).await;
        assert!(reply.contains("Rust Club"));
        assert!(reply.contains("Status: Enabled"));
    }

    #[tokio::test]
    async fn execute_reports_storage_failure() {
        let store = ConfigStore::new(Arc::new(OfflineStorage));
        let reply = execute(&store, GuildId(1), "g", AppMonitorCommand::Toggle).await;
        assert_eq!(reply, STORAGE_FAILURE_MSG);
    }

    #[tokio::test]
    async fn settings_storage_failure_is_not_reported_as_update() {
        let store = ConfigStore::new(Arc::new(OfflineStorage));
        let reply = execute(&store, GuildId(1), "g", AppMonitorCommand::Settings).await;
        assert_eq!(reply, SETTINGS_UNAVAILABLE_MSG);
    }
}
