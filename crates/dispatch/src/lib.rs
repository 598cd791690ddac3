//! Membership-application event dispatch.
//!
//! [`EventDispatcher::handle`] consults the guild's settings and either
//! suppresses the event or builds a [`NotificationRequest`] and hands it to
//! a [`Notifier`]. Delivery failures are logged, never propagated.

pub mod dispatcher;
pub mod event;
pub mod notification;
pub mod notifier;

pub use {
    dispatcher::{DispatchResult, EventDispatcher, SuppressReason},
    event::{Applicant, ApplicationEvent, ApplicationKind, UserId},
    notification::{NotificationField, NotificationRequest},
    notifier::{Notifier, NotifyError},
};
