use std::sync::Arc;

use {
    serenity::{
        all::{
            ChunkGuildFilter, Context, EventHandler, GatewayIntents, Guild,
            GuildMemberUpdateEvent, Interaction, Member, Ready, Timestamp, UnavailableGuild, User,
        },
        async_trait,
    },
    time::OffsetDateTime,
    tracing::{debug, info, warn},
};

use {
    appmonitor_dispatch::{Applicant, ApplicationEvent, DispatchResult, EventDispatcher, UserId},
    appmonitor_store::{ConfigStore, GuildId},
};

/// Required gateway intents. `GUILD_MEMBERS` is privileged and must be
/// enabled for the application in the developer portal.
pub fn required_intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS
}

/// Serenity event handler feeding member events into the dispatcher.
pub struct Handler {
    pub dispatcher: Arc<EventDispatcher>,
    pub store: Arc<ConfigStore>,
    pub register_commands: bool,
}

fn to_offset_datetime(ts: Timestamp) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(ts.unix_timestamp()).ok()
}

/// A member passed membership screening when the cached previous state was
/// pending and the update is not. Without a cached previous state the
/// transition cannot be observed.
pub fn screening_completed(was_pending: Option<bool>, is_pending: bool) -> bool {
    was_pending == Some(true) && !is_pending
}

fn applicant_from_user(user: &User, nick: Option<&str>, joined_at: Option<Timestamp>) -> Applicant {
    let display_name = nick
        .or(user.global_name.as_deref())
        .unwrap_or(&user.name)
        .to_string();
    Applicant {
        user_id: UserId(user.id.get()),
        display_name,
        tag: user.tag(),
        avatar_url: user.avatar_url(),
        account_created: to_offset_datetime(user.created_at()),
        joined_at: joined_at.and_then(to_offset_datetime),
    }
}

/// Turn a join into a submission. Members who skip screening are not
/// applicants. The event time is the join time when Discord reports one.
pub fn submission_event(member: &Member, now: OffsetDateTime) -> Option<ApplicationEvent> {
    if !member.pending {
        return None;
    }
    let applicant = applicant_from_user(&member.user, member.nick.as_deref(), member.joined_at);
    let timestamp = applicant.joined_at.unwrap_or(now);
    Some(ApplicationEvent::submitted(
        GuildId(member.guild_id.get()),
        applicant,
        timestamp,
    ))
}

/// Turn a member update into an approval, timestamped `now`.
pub fn approval_event(
    old: Option<&Member>,
    update: &GuildMemberUpdateEvent,
    now: OffsetDateTime,
) -> Option<ApplicationEvent> {
    if !screening_completed(old.map(|m| m.pending), update.pending) {
        return None;
    }
    let applicant =
        applicant_from_user(&update.user, update.nick.as_deref(), Some(update.joined_at));
    Some(ApplicationEvent::approved(
        GuildId(update.guild_id.get()),
        applicant,
        now,
    ))
}

/// GUILD_CREATE only carries a partial member list for larger guilds.
fn needs_member_chunk(member_count: u64, cached_members: usize) -> bool {
    u64::try_from(cached_members).unwrap_or(u64::MAX) < member_count
}

impl Handler {
    async fn dispatch(&self, event: ApplicationEvent) {
        let guild_id = event.guild_id;
        let user_id = event.applicant.user_id;
        match self.dispatcher.handle(event).await {
            DispatchResult::Dispatched(request) => debug!(
                %guild_id,
                %user_id,
                kind = %request.kind,
                "application event dispatched"
            ),
            DispatchResult::Suppressed(reason) => debug!(
                %guild_id,
                %user_id,
                %reason,
                "application event suppressed"
            ),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Discord bot connected as {}",
            ready.user.name,
        );

        if self.register_commands {
            crate::commands::register_global_commands(&ctx).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        crate::commands::handle_interaction(&ctx, &interaction, &self.store).await;
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, _is_new: Option<bool>) {
        // Approvals are only seen for members whose pending state is cached.
        if !needs_member_chunk(guild.member_count, guild.members.len()) {
            return;
        }
        debug!(
            guild_id = %guild.id,
            member_count = guild.member_count,
            cached = guild.members.len(),
            "requesting guild member chunks"
        );
        ctx.shard
            .chunk_guild(guild.id, None, false, ChunkGuildFilter::None, None);
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        let Some(event) = submission_event(&new_member, OffsetDateTime::now_utc()) else {
            return;
        };
        info!(
            guild_id = %event.guild_id,
            user_id = %event.applicant.user_id,
            "membership application submitted"
        );
        self.dispatch(event).await;
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        old_if_available: Option<Member>,
        _new: Option<Member>,
        update: GuildMemberUpdateEvent,
    ) {
        let Some(event) =
            approval_event(old_if_available.as_ref(), &update, OffsetDateTime::now_utc())
        else {
            return;
        };
        info!(
            guild_id = %event.guild_id,
            user_id = %event.applicant.user_id,
            "membership application approved"
        );
        self.dispatch(event).await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // `unavailable` means an outage, not a removal.
        if incomplete.unavailable {
            return;
        }

        let guild_id = GuildId(incomplete.id.get());
        match self.store.remove(guild_id).await {
            Ok(()) => info!(%guild_id, "bot removed from guild, settings dropped"),
            Err(e) => warn!(%guild_id, "failed to drop settings for departed guild: {e}"),
        }
    }
}
