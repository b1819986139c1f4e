//! Messenger Gateway - webhook receiver and event dispatcher.
//!
//! This library terminates the platform's webhook callbacks and routes every
//! inbound event to an application-registered handler:
//! - `web`: HTTP endpoint (handshake, delivery) and signature verification
//! - `events`: envelope decoding, event classification, handler dispatch
//! - `graph`: outbound Graph API calls (handover, broadcast, send, profile)
//!
//! ## Architecture
//!
//! ```text
//! POST → verify signature → decode envelope → classify event → handler
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod messenger;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{DecodeError, GraphError};
pub use events::{
    classify, decode, dispatch, Entry, Envelope, EventContext, EventPayload, HandlerRegistry,
    Kind, MessageOpts, MessagingEvent,
};
pub use graph::{DebugType, GraphClient};
pub use messenger::Messenger;
pub use web::AppState;
