//! Trigger type catalog with its priority and channel-class lookup tables.
//!
//! Both tables are bookkeeping only: the matrix never gates or orders
//! delivery by them.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub const SYSTEM_SHUTDOWN: &str = "system.shutdown";
pub const SECURITY_ALERT: &str = "security.alert";
pub const SYSTEM_HEALTH: &str = "system.health";

pub const CONTEXT_STORE: &str = "context.store";
pub const CONTEXT_RETRIEVE: &str = "context.retrieve";
pub const CONTEXT_TRANSFORM: &str = "context.transform";
pub const CONTEXT_TO_MAP: &str = "context.to_map";
pub const CONTEXT_FROM_MAP: &str = "context.from_map";
pub const CONTEXT_LOG: &str = "context.log";

pub const PERSIST_STORE: &str = "persist.store";
pub const PERSIST_RETRIEVE: &str = "persist.retrieve";
pub const PERSIST_DELETE: &str = "persist.delete";
pub const PERSIST_QUERY: &str = "persist.query";

pub const API_REQUEST: &str = "api.request";
pub const API_RESPONSE: &str = "api.response";

/// Coarse category a trigger falls into, derived from its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelClass {
    /// Lifecycle, health and security signals.
    Control,
    /// Notifications about something that happened.
    Event,
    /// Context and persistence traffic. Fallback for unknown types.
    #[default]
    Data,
}

impl ChannelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Event => "event",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for ChannelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling tier; lower ordinals are more urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical = 0,
    Security = 1,
    System = 2,
    Context = 3,
    /// Fallback for unknown types.
    #[default]
    Integration = 4,
    Data = 5,
    Background = 6,
}

impl Priority {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Critical),
            1 => Some(Self::Security),
            2 => Some(Self::System),
            3 => Some(Self::Context),
            4 => Some(Self::Integration),
            5 => Some(Self::Data),
            6 => Some(Self::Background),
            _ => None,
        }
    }
}

static ROUTING_TABLE: Lazy<HashMap<&'static str, (Priority, ChannelClass)>> = Lazy::new(|| {
    HashMap::from([
        (SYSTEM_SHUTDOWN, (Priority::Critical, ChannelClass::Control)),
        (SECURITY_ALERT, (Priority::Security, ChannelClass::Control)),
        (SYSTEM_HEALTH, (Priority::System, ChannelClass::Control)),
        (CONTEXT_STORE, (Priority::Context, ChannelClass::Data)),
        (CONTEXT_RETRIEVE, (Priority::Context, ChannelClass::Data)),
        (CONTEXT_TRANSFORM, (Priority::Context, ChannelClass::Data)),
        (CONTEXT_TO_MAP, (Priority::Context, ChannelClass::Data)),
        (CONTEXT_FROM_MAP, (Priority::Context, ChannelClass::Data)),
        (CONTEXT_LOG, (Priority::Background, ChannelClass::Event)),
        (PERSIST_STORE, (Priority::Data, ChannelClass::Data)),
        (PERSIST_RETRIEVE, (Priority::Data, ChannelClass::Data)),
        (PERSIST_DELETE, (Priority::Data, ChannelClass::Data)),
        (PERSIST_QUERY, (Priority::Data, ChannelClass::Data)),
        (API_REQUEST, (Priority::Integration, ChannelClass::Event)),
        (API_RESPONSE, (Priority::Integration, ChannelClass::Event)),
    ])
});

/// Channel class for a trigger type; unknown types are [`ChannelClass::Data`].
pub fn channel_class(trigger_type: &str) -> ChannelClass {
    ROUTING_TABLE
        .get(trigger_type)
        .map(|(_, class)| *class)
        .unwrap_or_default()
}

/// Priority for a trigger type; unknown types are [`Priority::Integration`].
pub fn trigger_priority(trigger_type: &str) -> Priority {
    ROUTING_TABLE
        .get(trigger_type)
        .map(|(priority, _)| *priority)
        .unwrap_or_default()
}
