use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {tokio::sync::Mutex as AsyncMutex, tracing::debug};

use crate::{
    Error, Result,
    storage::Storage,
    types::{ChannelId, GuildConfig, GuildId, RoleId, storage_key},
};

/// Guild-keyed settings store.
///
/// Reads go straight to storage. Writes for one guild are serialized through
/// a per-guild async mutex so read-modify-write cycles (notably `toggle`)
/// never lose updates; different guilds never wait on each other.
pub struct ConfigStore {
    storage: Arc<dyn Storage>,
    locks: Mutex<HashMap<GuildId, Arc<AsyncMutex<()>>>>,
}

impl ConfigStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Stored settings, or unsaved defaults when the guild has none yet.
    pub async fn get(&self, guild_id: GuildId) -> Result<GuildConfig> {
        Ok(self.load(guild_id).await?.0)
    }

    /// Read-only view for the settings display.
    pub async fn snapshot(&self, guild_id: GuildId) -> Result<GuildConfig> {
        self.get(guild_id).await
    }

    /// Set or clear (`None`) the notification channel.
    pub async fn set_channel(
        &self,
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
    ) -> Result<GuildConfig> {
        self.update(guild_id, |cfg| cfg.notification_channel_id = channel_id)
            .await
    }

    /// Set or clear (`None`) the mention role.
    pub async fn set_role(&self, guild_id: GuildId, role_id: Option<RoleId>) -> Result<GuildConfig> {
        self.update(guild_id, |cfg| cfg.notification_role_id = role_id)
            .await
    }

    /// Flip `enabled` and return the new value.
    pub async fn toggle(&self, guild_id: GuildId) -> Result<bool> {
        let cfg = self.update(guild_id, |cfg| cfg.enabled = !cfg.enabled).await?;
        Ok(cfg.enabled)
    }

    /// Drop the guild's record. The next read yields defaults again.
    pub async fn remove(&self, guild_id: GuildId) -> Result<()> {
        let lock = self.guild_lock(guild_id);
        let _guard = lock.lock().await;
        self.storage.delete(&storage_key(guild_id)).await?;
        self.release_lock(guild_id, &lock);
        debug!(%guild_id, "guild settings removed");
        Ok(())
    }

    fn guild_lock(&self, guild_id: GuildId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(guild_id).or_default())
    }

    /// Forget a guild's lock once only the map and `held` reference it.
    /// Clones are taken under the map lock, so the count cannot grow here.
    fn release_lock(&self, guild_id: GuildId, held: &Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let idle = locks
            .get(&guild_id)
            .is_some_and(|lock| Arc::ptr_eq(lock, held) && Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(&guild_id);
        }
    }

    /// Returns the config and whether it came from storage.
    async fn load(&self, guild_id: GuildId) -> Result<(GuildConfig, bool)> {
        let key = storage_key(guild_id);
        let Some(bytes) = self.storage.load(&key).await? else {
            return Ok((GuildConfig::new(guild_id), false));
        };
        let mut cfg: GuildConfig =
            serde_json::from_slice(&bytes).map_err(|source| Error::Decode { key, source })?;
        // The key is authoritative for identity.
        cfg.guild_id = guild_id;
        Ok((cfg, true))
    }

    async fn update<F>(&self, guild_id: GuildId, apply: F) -> Result<GuildConfig>
    where
        F: FnOnce(&mut GuildConfig),
    {
        let lock = self.guild_lock(guild_id);
        let _guard = lock.lock().await;

        let (mut cfg, stored) = self.load(guild_id).await?;
        let before = cfg.clone();
        apply(&mut cfg);

        if stored && cfg == before {
            return Ok(cfg);
        }

        let bytes = serde_json::to_vec(&cfg).map_err(Error::Encode)?;
        self.storage.save(&storage_key(guild_id), &bytes).await?;
        debug!(
            %guild_id,
            channel_id = ?cfg.notification_channel_id,
            role_id = ?cfg.notification_role_id,
            enabled = cfg.enabled,
            "guild settings saved"
        );
        Ok(cfg)
    }
}
