//! Discord integration for the application monitor.
//!
//! Connects to the Discord Gateway via serenity, turns membership-screening
//! member events into application events for the dispatcher, posts
//! notifications through the REST API and exposes the `/appmonitor`
//! configuration command.

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod outbound;

pub use {
    bot::AppMonitorBot,
    config::DiscordConfig,
    error::{Error, Result},
    outbound::DiscordNotifier,
};
