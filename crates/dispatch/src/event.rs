use std::fmt;

use {appmonitor_store::GuildId, time::OffsetDateTime};

/// Identifier of the applying user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

impl UserId {
    /// Platform mention markup for this user.
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stage of a membership application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationKind {
    /// Joined with membership screening still pending.
    Submitted,
    /// Completed membership screening.
    Approved,
}

impl ApplicationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for ApplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata about the applicant, passed through to the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub user_id: UserId,
    /// Guild nickname or global display name.
    pub display_name: String,
    /// Account handle, e.g. `someone` or legacy `someone#1234`.
    pub tag: String,
    pub avatar_url: Option<String>,
    pub account_created: Option<OffsetDateTime>,
    pub joined_at: Option<OffsetDateTime>,
}

/// A lifecycle event delivered by the host platform. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationEvent {
    pub kind: ApplicationKind,
    pub guild_id: GuildId,
    pub applicant: Applicant,
    /// When the event happened on the platform.
    pub timestamp: OffsetDateTime,
}

impl ApplicationEvent {
    pub fn submitted(guild_id: GuildId, applicant: Applicant, timestamp: OffsetDateTime) -> Self {
        Self {
            kind: ApplicationKind::Submitted,
            guild_id,
            applicant,
            timestamp,
        }
    }

    pub fn approved(guild_id: GuildId, applicant: Applicant, timestamp: OffsetDateTime) -> Self {
        Self {
            kind: ApplicationKind::Approved,
            guild_id,
            applicant,
            timestamp,
        }
    }
}
