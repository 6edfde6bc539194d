//! Welcome/farewell configuration and rendering.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use spiritbox_core::{GreetingKind, Notification};
use spiritbox_error::DatabaseResult;
use spiritbox_interface::NotificationSink;

/// Per-guild greeting configuration.
///
/// Templates use `{user}`, `{guild}`, and `{memberCount}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreetingConfig {
    /// Discord guild id
    pub guild_id: i64,
    /// Whether welcome messages are sent
    pub welcome_enabled: bool,
    /// Channel welcome messages go to
    pub welcome_channel_id: Option<i64>,
    /// Welcome template
    pub welcome_template: String,
    /// Whether farewell messages are sent
    pub farewell_enabled: bool,
    /// Channel farewell messages go to
    pub farewell_channel_id: Option<i64>,
    /// Farewell template
    pub farewell_template: String,
}

impl GreetingConfig {
    /// Default configuration for a guild: both directions disabled until
    /// an admin picks channels.
    pub fn disabled(guild_id: i64) -> Self {
        Self {
            guild_id,
            welcome_enabled: false,
            welcome_channel_id: None,
            welcome_template: "Welcome to {guild}, {user}! You are investigator #{memberCount}."
                .to_string(),
            farewell_enabled: false,
            farewell_channel_id: None,
            farewell_template: "{user} has crossed over. {memberCount} investigators remain."
                .to_string(),
        }
    }
}

/// Greeting configuration persistence.
#[async_trait]
pub trait GreetingStore: Send + Sync {
    /// Fetch a guild's configuration, `None` when never configured.
    async fn find(&self, guild_id: i64) -> DatabaseResult<Option<GreetingConfig>>;

    /// Insert or replace a guild's configuration.
    async fn upsert(&self, config: &GreetingConfig) -> DatabaseResult<()>;
}

/// A member join/leave event from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    /// Discord guild id
    pub guild_id: i64,
    /// Display name used for the `{user}` placeholder
    pub display_name: String,
    /// Guild name used for the `{guild}` placeholder
    pub guild_name: String,
    /// Member count after the event
    pub member_count: i64,
}

/// Fill a greeting template's placeholders.
pub fn render_template(template: &str, event: &MemberEvent) -> String {
    template
        .replace("{user}", &event.display_name)
        .replace("{guild}", &event.guild_name)
        .replace("{memberCount}", &event.member_count.to_string())
}

/// Turns member events into rendered greeting notifications.
pub struct GreetingService {
    store: Arc<dyn GreetingStore>,
    sink: Arc<dyn NotificationSink>,
}

impl GreetingService {
    /// Create a service over a config store and a sink.
    pub fn new(store: Arc<dyn GreetingStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    /// Handle a member joining. No configuration, a disabled direction,
    /// or a missing channel all mean silence, not an error.
    #[instrument(skip(self, event), fields(guild_id = event.guild_id))]
    pub async fn member_joined(&self, event: &MemberEvent) -> DatabaseResult<()> {
        self.deliver(event, GreetingKind::Welcome).await
    }

    /// Handle a member leaving.
    #[instrument(skip(self, event), fields(guild_id = event.guild_id))]
    pub async fn member_left(&self, event: &MemberEvent) -> DatabaseResult<()> {
        self.deliver(event, GreetingKind::Farewell).await
    }

    async fn deliver(&self, event: &MemberEvent, kind: GreetingKind) -> DatabaseResult<()> {
        let Some(config) = self.store.find(event.guild_id).await? else {
            debug!(guild_id = event.guild_id, "No greeting config");
            return Ok(());
        };

        let (enabled, channel, template) = match kind {
            GreetingKind::Welcome => (
                config.welcome_enabled,
                config.welcome_channel_id,
                &config.welcome_template,
            ),
            GreetingKind::Farewell => (
                config.farewell_enabled,
                config.farewell_channel_id,
                &config.farewell_template,
            ),
        };

        let Some(channel_id) = channel.filter(|_| enabled) else {
            debug!(guild_id = event.guild_id, kind = ?kind, "Greeting direction disabled");
            return Ok(());
        };

        self.sink
            .notify(Notification::MemberGreeting {
                guild_id: event.guild_id,
                channel_id,
                content: render_template(template, event),
                kind,
            })
            .await;
        Ok(())
    }
}
