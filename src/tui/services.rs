use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::core::models::User;

use super::events::{AppEvent, Notification, NotificationLevel};

/// Handle to the backend and the app event channel.
///
/// Created once at startup and passed by reference to views. Views clone
/// `api` into the tasks they spawn.
pub struct Services {
    pub api: ApiClient,
    pub user: User,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    /// Failures here are fatal: the TUI cannot run without an HTTP client.
    pub fn init(
        config: &AppConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let api = ApiClient::from_config(&config.api)?;
        log::info!(
            "API client ready: {} (timeout {}s)",
            api.base_url(),
            config.api.timeout_secs
        );

        Ok(Self {
            api,
            user: config.user(),
            event_tx,
        })
    }

    /// Queue a notification for the overlay. The id is assigned by `AppState`.
    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let _ = self.event_tx.send(AppEvent::Notification(Notification {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 100,
        }));
    }

    /// Log a failed operation and surface it as an error notification.
    pub fn report_error(&self, what: &str, error: &impl std::fmt::Display) {
        log::warn!("Failed to {what}: {error}");
        self.notify(format!("Failed to {what}: {error}"), NotificationLevel::Error);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Services pointed at an unroutable backend, plus the event receiver.
    pub fn services() -> (Services, mpsc::UnboundedReceiver<AppEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let services = Services {
            api: ApiClient::new("http://127.0.0.1:9/api"),
            user: AppConfig::default().user(),
            event_tx,
        };
        (services, event_rx)
    }
}
