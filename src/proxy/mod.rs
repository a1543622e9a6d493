//! HTTP proxy module.
//!
//! Accepts requests from the browser client and forwards them to the
//! speech and chat providers with a server-held key.

pub mod envelope;
mod handlers;
pub mod invoker;
pub mod pipeline;
mod server;
pub mod translate;
pub mod types;

pub use envelope::{Envelope, EnvelopeBody, ErrorBody, ProviderKind};
pub use pipeline::{ChatPipeline, InboundEvent, TtsPipeline};
pub use server::{create_router, run_server, AppState, RequestId};
