use std::{fmt, sync::Arc};

use {
    appmonitor_store::{ChannelId, ConfigStore, GuildConfig, RoleId},
    tracing::{debug, error, info, warn},
};

use crate::{event::ApplicationEvent, notification::NotificationRequest, notifier::Notifier};

/// Why an event produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Disabled,
    MissingChannel,
    MissingRole,
    /// Settings could not be read; the storage error was logged.
    ConfigUnavailable,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::MissingChannel => "missing_channel",
            Self::MissingRole => "missing_role",
            Self::ConfigUnavailable => "config_unavailable",
        })
    }
}

/// Terminal state of a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Suppressed(SuppressReason),
    /// The request was handed to the notifier. Delivery may still have
    /// failed; that is logged, not reported here.
    Dispatched(NotificationRequest),
}

impl DispatchResult {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    pub fn request(&self) -> Option<&NotificationRequest> {
        match self {
            Self::Dispatched(req) => Some(req),
            Self::Suppressed(_) => None,
        }
    }
}

/// Decide whether a guild's settings allow a notification.
pub fn evaluate(config: &GuildConfig) -> Result<(ChannelId, RoleId), SuppressReason> {
    if !config.enabled {
        return Err(SuppressReason::Disabled);
    }
    let channel = config
        .notification_channel_id
        .ok_or(SuppressReason::MissingChannel)?;
    let role = config
        .notification_role_id
        .ok_or(SuppressReason::MissingRole)?;
    Ok((channel, role))
}

/// Stateless between events; all state lives in the [`ConfigStore`].
pub struct EventDispatcher {
    store: Arc<ConfigStore>,
    notifier: Arc<dyn Notifier>,
}

impl EventDispatcher {
    pub fn new(store: Arc<ConfigStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Handle one event to completion. Never fails: storage and delivery
    /// errors are logged and the event path keeps going.
    pub async fn handle(&self, event: ApplicationEvent) -> DispatchResult {
        let guild_id = event.guild_id;
        let kind = event.kind;

        let config = match self.store.get(guild_id).await {
            Ok(config) => config,
            Err(e) => {
                error!(%guild_id, %kind, "failed to read application monitor settings: {e}");
                return DispatchResult::Suppressed(SuppressReason::ConfigUnavailable);
            },
        };

        let (channel_id, role_id) = match evaluate(&config) {
            Ok(target) => target,
            Err(reason) => {
                if reason == SuppressReason::Disabled {
                    debug!(%guild_id, %kind, %reason, "application event suppressed");
                } else {
                    warn!(
                        %guild_id,
                        %kind,
                        %reason,
                        "application monitor enabled but not fully configured"
                    );
                }
                return DispatchResult::Suppressed(reason);
            },
        };

        let request = NotificationRequest::build(&event, channel_id, role_id);
        match self.notifier.send(&request).await {
            Ok(()) => info!(
                %guild_id,
                %channel_id,
                %kind,
                user_id = %event.applicant.user_id,
                "application notification sent"
            ),
            Err(e) if e.is_transient() => warn!(
                %guild_id,
                %channel_id,
                %kind,
                "application notification failed: {e}"
            ),
            Err(e) => error!(
                %guild_id,
                %channel_id,
                %kind,
                "application notification failed: {e}"
            ),
        }
        DispatchResult::Dispatched(request)
    }
}
