use {
    appmonitor_store::{ChannelId, GuildId, RoleId},
    time::{
        OffsetDateTime, UtcOffset,
        format_description::{BorrowedFormatItem, well_known::Rfc3339},
        macros::format_description,
    },
};

use crate::event::{ApplicationEvent, ApplicationKind};

const SUBMITTED_TITLE: &str = "New Membership Application";
const APPROVED_TITLE: &str = "Application Approved";

const SUBMITTED_COLOR: u32 = 0x3498DB;
const APPROVED_COLOR: u32 = 0x2ECC71;

const FIELD_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// One inline name/value pair shown under the notification body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
}

impl NotificationField {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Everything the notifier needs to post one alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub mention_role_id: RoleId,
    pub kind: ApplicationKind,
    pub title: String,
    /// Plain message text carrying the role mention.
    pub content: String,
    pub body: String,
    pub fields: Vec<NotificationField>,
    pub thumbnail_url: Option<String>,
    pub color: u32,
    /// Event time, not dispatch time.
    pub timestamp: OffsetDateTime,
}

impl NotificationRequest {
    pub fn build(event: &ApplicationEvent, channel_id: ChannelId, role_id: RoleId) -> Self {
        let applicant = &event.applicant;
        let mention = applicant.user_id.mention();
        let role_mention = format!("<@&{role_id}>");
        let user_field = NotificationField::new(
            "User",
            format!("{} ({})", applicant.tag, applicant.user_id),
        );

        let (title, content, headline, color, fields) = match event.kind {
            ApplicationKind::Submitted => (
                SUBMITTED_TITLE,
                format!("{role_mention} - New application received!"),
                format!(
                    "**{mention}** ({}) has applied to join the server.",
                    applicant.display_name
                ),
                SUBMITTED_COLOR,
                vec![
                    user_field,
                    NotificationField::new(
                        "Account Created",
                        format_field_time(applicant.account_created),
                    ),
                    NotificationField::new("Joined At", format_field_time(applicant.joined_at)),
                ],
            ),
            ApplicationKind::Approved => (
                APPROVED_TITLE,
                format!("{role_mention} - Member approved!"),
                format!(
                    "**{mention}** ({}) has completed membership screening and joined the server!",
                    applicant.display_name
                ),
                APPROVED_COLOR,
                vec![
                    user_field,
                    NotificationField::new(
                        "Originally Joined",
                        format_field_time(applicant.joined_at),
                    ),
                ],
            ),
        };

        Self {
            guild_id: event.guild_id,
            channel_id,
            mention_role_id: role_id,
            kind: event.kind,
            title: title.to_string(),
            content,
            body: format!(
                "{headline}\nEvent time: {}",
                format_event_time(event.timestamp)
            ),
            fields,
            thumbnail_url: applicant.avatar_url.clone(),
            color,
            timestamp: event.timestamp,
        }
    }
}

/// RFC 3339 in UTC, e.g. `2026-10-16T09:30:00Z`.
pub fn format_event_time(at: OffsetDateTime) -> String {
    at.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

fn format_field_time(at: Option<OffsetDateTime>) -> String {
    at.and_then(|t| t.to_offset(UtcOffset::UTC).format(FIELD_TIME_FORMAT).ok())
        .unwrap_or_else(|| "Unknown".to_string())
}
