use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    serenity::http::Http,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    appmonitor_dispatch::{EventDispatcher, Notifier},
    appmonitor_store::ConfigStore,
};

use crate::{
    Error, Result,
    config::DiscordConfig,
    handler::{Handler, required_intents},
    outbound::DiscordNotifier,
};

/// Wires the settings store, dispatcher and Discord client together.
pub struct AppMonitorBot {
    config: DiscordConfig,
    store: Arc<ConfigStore>,
}

impl AppMonitorBot {
    pub fn new(config: DiscordConfig, store: Arc<ConfigStore>) -> Self {
        Self { config, store }
    }

    /// Connect to the gateway and process events until `cancel` fires or the
    /// client stops on its own.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if !self.config.has_token() {
            return Err(Error::Config("Discord bot token is required".into()));
        }
        let token = self.config.token.expose_secret().trim().to_string();

        let http = Arc::new(Http::new(&token));
        let notifier: Arc<dyn Notifier> = Arc::new(DiscordNotifier::new(http));
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&self.store), notifier));
        let handler = Handler {
            dispatcher,
            store: Arc::clone(&self.store),
            register_commands: self.config.register_commands,
        };

        info!("starting discord client");
        let mut client = serenity::Client::builder(&token, required_intents())
            .event_handler(handler)
            .await
            .map_err(|e| Error::Gateway(format!("failed to build Discord client: {e}")))?;
        let shard_manager = Arc::clone(&client.shard_manager);

        tokio::select! {
            result = client.start() => {
                if let Err(e) = result {
                    warn!("Discord client stopped with error: {e}");
                    return Err(Error::Gateway(e.to_string()));
                }
            }
            () = cancel.cancelled() => {
                info!("Discord client shutting down");
                shard_manager.shutdown_all().await;
            }
        }
        Ok(())
    }
}
