//! # cas-tracer
//!
//! Lock-free tracing of live configuration-field mutations.
//!
//! Every observed mutation carries the value the call site believes is
//! current. The tracer applies it with a compare-and-swap against its own
//! state table; accepted mutations become fixed-layout [`ChangeEvent`]s on a
//! bounded, best-effort channel, and stale ones are dropped silently.
//!
//! ```text
//! call site ──notify_mutation()──▶ Tracer ──▶ MutationValidator ──CAS──▶ StateStore
//!                                    │
//!                                    └──publish()──▶ ChannelEmitter ──▶ EventStream
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use cas_tracer::{FieldRegistry, Tracer, ChannelConfig};
//!
//! let tracer = Tracer::new(FieldRegistry::reference(), &ChannelConfig::default())?;
//! let events = tracer.subscribe()?;
//! tracer.initialize()?;
//!
//! // terminalMode: 1 -> 0
//! assert!(tracer.notify_mutation(3, 1, 0, 42)?);
//! // stale expected value: rejected, no event
//! assert!(!tracer.notify_mutation(3, 1, 0, 42)?);
//!
//! tracer.shutdown();
//! let received: Vec<_> = events.collect();
//! assert_eq!(received.len(), 1);
//! ```

mod config;
mod constants;
mod emitter;
mod errors;
mod event;
mod metrics;
mod registry;
mod store;
mod tracer;
mod validator;
pub mod utils;

pub use config::*;
pub use constants::EVENT_RECORD_LEN;
pub use constants::FIELD_NAME_LEN;
pub use emitter::*;
pub use errors::*;
pub use event::*;
pub use metrics::*;
pub use registry::*;
pub use store::*;
pub use tracer::*;
pub use utils::*;
pub use validator::*;
