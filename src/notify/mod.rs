//! Notification routing and dispatch.

pub mod dispatcher;
pub mod notify_model;
pub mod notify_traits;

pub use dispatcher::NotificationDispatcher;
pub use notify_model::{render, MessageField, MessagePayload, RouteTable};
pub use notify_traits::{NotificationSink, SinkError};
