//! Inbound event pipeline: decode, classify, dispatch.
//!
//! ## Processing Flow
//!
//! ```text
//! raw body → decode() → Envelope → for each Entry: dispatch() → classify() → handler
//! ```

pub mod classify;
pub mod decode;
pub mod dispatch;
pub mod types;

pub use classify::{classify, Kind};
pub use decode::decode;
pub use dispatch::{dispatch, AuthenticationHandler, EventContext, Handler, HandlerRegistry};
pub use types::{
    Attachment, AttachmentPayload, Coordinates, Delivery, Entry, Envelope, EventPayload,
    MessageEcho, MessageOpts, MessagingEvent, Optin, Participant, PassThreadControl, Postback,
    QuickReply, Read, ReceivedMessage, Referral, RequestThreadControl, TakeThreadControl,
};
