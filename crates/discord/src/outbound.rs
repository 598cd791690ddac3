use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::{
        all::{
            ChannelId, CreateAllowedMentions, CreateEmbed, CreateMessage, GuildId, RoleId,
            Timestamp,
        },
        http::{Http, HttpError},
    },
    tracing::debug,
};

use appmonitor_dispatch::{NotificationRequest, Notifier, NotifyError};

// ── Discord JSON error codes ─────────────────────────────────────────

const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_ROLE: isize = 10011;
const MISSING_ACCESS: isize = 50001;
const MISSING_PERMISSIONS: isize = 50013;

/// Posts notifications through the Discord REST API.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        // Serenity ids are non-zero; a zero id can only come from a bad record.
        if request.channel_id.get() == 0 || request.guild_id.get() == 0 {
            return Err(NotifyError::ChannelNotFound);
        }
        if request.mention_role_id.get() == 0 {
            return Err(NotifyError::RoleNotFound);
        }
        let channel_id = ChannelId::new(request.channel_id.get());
        let role_id = RoleId::new(request.mention_role_id.get());

        let roles = self
            .http
            .get_guild_roles(GuildId::new(request.guild_id.get()))
            .await
            .map_err(|e| classify_error(&e))?;
        ensure_role_exists(roles.iter().map(|role| role.id), role_id)?;

        let message = CreateMessage::new()
            .content(&request.content)
            .embed(build_embed(request))
            .allowed_mentions(CreateAllowedMentions::new().roles(vec![role_id]));

        let sent = channel_id
            .send_message(&self.http, message)
            .await
            .map_err(|e| classify_error(&e))?;
        debug!(
            guild_id = %request.guild_id,
            %channel_id,
            message_id = %sent.id,
            "discord notification posted"
        );
        Ok(())
    }
}

/// Discord posts a mention of a deleted role without complaint, so the
/// target is checked against the guild's current roles first.
fn ensure_role_exists(
    roles: impl IntoIterator<Item = RoleId>,
    role_id: RoleId,
) -> Result<(), NotifyError> {
    if roles.into_iter().any(|id| id == role_id) {
        Ok(())
    } else {
        Err(NotifyError::RoleNotFound)
    }
}

fn build_embed(request: &NotificationRequest) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&request.title)
        .description(&request.body)
        .color(request.color);
    for field in &request.fields {
        embed = embed.field(&field.name, &field.value, true);
    }
    if let Some(url) = &request.thumbnail_url {
        embed = embed.thumbnail(url);
    }
    if let Ok(timestamp) = Timestamp::from_unix_timestamp(request.timestamp.unix_timestamp()) {
        embed = embed.timestamp(timestamp);
    }
    embed
}

fn classify_error(err: &serenity::Error) -> NotifyError {
    match err {
        serenity::Error::Http(http_err) => classify_http_error(http_err),
        other => NotifyError::TransientFailure(other.to_string()),
    }
}

fn classify_http_error(err: &HttpError) -> NotifyError {
    match err {
        HttpError::UnsuccessfulRequest(response) => classify_response(
            response.status_code.as_u16(),
            response.error.code,
            &response.error.message,
        ),
        other => NotifyError::TransientFailure(other.to_string()),
    }
}

/// Map a failed REST response to a delivery error.
pub fn classify_response(status: u16, code: isize, message: &str) -> NotifyError {
    match (status, code) {
        (_, MISSING_ACCESS | MISSING_PERMISSIONS) | (403, _) => NotifyError::PermissionDenied,
        (_, UNKNOWN_CHANNEL) => NotifyError::ChannelNotFound,
        (_, UNKNOWN_ROLE) => NotifyError::RoleNotFound,
        (404, _) => NotifyError::ChannelNotFound,
        _ => NotifyError::TransientFailure(format!("HTTP {status} (code {code}): {message}")),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        appmonitor_dispatch::{Applicant, ApplicationEvent, UserId},
        appmonitor_store::{ChannelId as CfgChannelId, GuildId, RoleId as CfgRoleId},
        time::macros::datetime,
    };

    fn request(avatar: Option<&str>) -> NotificationRequest {
        let event = ApplicationEvent::submitted(
            GuildId(1),
            Applicant {
                user_id: UserId(7),
                display_name: "Linus".into(),
                tag: "linus".into(),
                avatar_url: avatar.map(String::from),
                account_created: Some(datetime!(2018-01-01 00:00 UTC)),
                joined_at: Some(datetime!(2026-10-16 09:30 UTC)),
            },
            datetime!(2026-10-16 09:30 UTC),
        );
        NotificationRequest::build(&event, CfgChannelId(10), CfgRoleId(20))
    }

    #[test]
    fn forbidden_maps_to_permission_denied() {
        assert_eq!(
            classify_response(403, MISSING_PERMISSIONS, "Missing Permissions"),
            NotifyError::PermissionDenied
        );
        assert_eq!(
            classify_response(403, 0, "Forbidden"),
            NotifyError::PermissionDenied
        );
        assert_eq!(
            classify_response(400, MISSING_ACCESS, "Missing Access"),
            NotifyError::PermissionDenied
        );
    }

    #[test]
    fn unknown_entities_map_to_not_found() {
        assert_eq!(
            classify_response(404, UNKNOWN_CHANNEL, "Unknown Channel"),
            NotifyError::ChannelNotFound
        );
        assert_eq!(
            classify_response(404, UNKNOWN_ROLE, "Unknown Role"),
            NotifyError::RoleNotFound
        );
        assert_eq!(
            classify_response(404, 0, "Not Found"),
            NotifyError::ChannelNotFound
        );
    }

    #[test]
    fn configured_role_must_still_exist() {
        let roles = [RoleId::new(1), RoleId::new(20), RoleId::new(300)];
        assert_eq!(ensure_role_exists(roles, RoleId::new(20)), Ok(()));
        assert_eq!(
            ensure_role_exists(roles, RoleId::new(21)),
            Err(NotifyError::RoleNotFound)
        );
    }

    #[test]
    fn empty_role_list_rejects_mention() {
        assert_eq!(
            ensure_role_exists(Vec::new(), RoleId::new(20)),
            Err(NotifyError::RoleNotFound)
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify_response(502, 0, "Bad Gateway");
        assert!(err.is_transient());
        assert!(err.to_string().contains("HTTP 502"));
        assert!(classify_response(429, 0, "rate limited").is_transient());
    }

    #[test]
    fn embed_carries_request_fields() {
        let req = request(Some("https://cdn.example/a.png"));
        let json = serde_json::to_value(build_embed(&req))
            .unwrap_or_else(|e| panic!("failed to serialize embed: {e}"));
        assert_eq!(json["title"], "New Membership Application");
        assert_eq!(json["description"], req.body.as_str());
        assert_eq!(json["color"], 0x3498DB);
        assert_eq!(json["thumbnail"]["url"], "https://cdn.example/a.png");
        let fields = json["fields"]
            .as_array()
            .unwrap_or_else(|| panic!("fields missing"));
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["name"], "User");
        assert_eq!(fields[0]["inline"], true);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn embed_without_avatar_has_no_thumbnail() {
        let json = serde_json::to_value(build_embed(&request(None)))
            .unwrap_or_else(|e| panic!("failed to serialize embed: {e}"));
        assert!(json.get("thumbnail").is_none_or(serde_json::Value::is_null));
    }
}
