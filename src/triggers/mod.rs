//! Trigger routing: the trigger type, its lookup tables and the dispatcher.

pub mod matrix;
pub mod routing;
pub mod trigger;

pub use matrix::{HandlerResult, TriggerHandler, TriggerMatrix};
pub use routing::{channel_class, trigger_priority, ChannelClass, Priority};
pub use trigger::{Payload, Trigger};
