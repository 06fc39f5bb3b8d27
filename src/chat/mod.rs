//! # Chat Subsystem
//!
//! Real-time messaging: the in-memory connection registry, the typed wire
//! events, and the protocol service that validates inbound events against
//! persisted membership state and fans results out to live connections.

pub mod events;
pub mod registry;
pub mod service;

pub use events::{InboundEvent, NewMessageEvent, NewConversationEvent, TypingEvent};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use service::ChatService;
