//! Cross-platform message envelope construction.
//!
//! `MessageBuilder` turns one logical notification into the platform blocks
//! the gateway fans out to devices. Channel routing and interruption levels
//! are derived from the alert kind; urgency maps to both the Android
//! transport priority and the on-device notification priority.

use std::collections::BTreeMap;

use serde::Serialize;

use vigil_common::types::{AlertKind, MessagePriority};

/// Top-level notification block shown by the platform UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Android delivery and presentation overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub priority: &'static str,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    pub channel_id: &'static str,
    pub priority: &'static str,
    pub default_sound: bool,
    pub default_vibrate_timings: bool,
    pub visibility: &'static str,
}

/// APNs payload wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aps {
    pub alert: ApsAlert,
    pub sound: &'static str,
    pub badge: u32,
    #[serde(rename = "interruption-level")]
    pub interruption_level: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApsAlert {
    pub title: String,
    pub body: String,
}

/// A fully built message, ready for the transport.
///
/// Construction is deterministic: the same builder inputs always produce an
/// identical envelope, including data attribute order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEnvelope {
    pub notification: NotificationContent,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

/// Builder applying the platform presentation policy for an alert kind.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    kind: AlertKind,
    title: String,
    body: String,
    data: BTreeMap<String, String>,
    priority: MessagePriority,
}

impl MessageBuilder {
    pub fn new(kind: AlertKind) -> Self {
        Self {
            kind,
            title: String::new(),
            body: String::new(),
            data: BTreeMap::new(),
            priority: MessagePriority::Normal,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach one data attribute. Attributes ride alongside the notification
    /// for client-side routing and must already be strings.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach a whole attribute map at once.
    pub fn data_map(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.data.extend(attributes);
        self
    }

    pub fn priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn build(self) -> MessageEnvelope {
        let transport_priority = if self.priority.is_high() { "high" } else { "normal" };
        let notification_priority = if self.priority.is_high() { "max" } else { "default" };

        MessageEnvelope {
            notification: NotificationContent {
                title: self.title.clone(),
                body: self.body.clone(),
            },
            data: self.data,
            android: AndroidConfig {
                priority: transport_priority,
                notification: AndroidNotification {
                    channel_id: channel_for(self.kind),
                    priority: notification_priority,
                    default_sound: true,
                    default_vibrate_timings: true,
                    visibility: "public",
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        alert: ApsAlert {
                            title: self.title,
                            body: self.body,
                        },
                        sound: "default",
                        badge: 1,
                        interruption_level: interruption_for(self.kind),
                    },
                },
            },
        }
    }
}

/// Android channel each alert kind lands on.
fn channel_for(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::SosAlert => "sos_alerts",
        AlertKind::EscortRequest => "escort_requests",
        AlertKind::BgvUpdate | AlertKind::Generic => "general",
    }
}

/// iOS interruption level. Only SOS traffic may break through focus modes.
fn interruption_for(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::SosAlert => "critical",
        _ => "active",
    }
}
