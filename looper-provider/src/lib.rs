//! Synthetic publisher media for load tests.
//!
//! Data Flow:
//! ```text
//!                   ┌─ filter by codec ─► rotate ─► truncate by tier ─┐
//! Catalog (ladders) ┤                                                 ├─► [VideoSpec] ─► open resource ─► VideoLooper
//!                   └─ audio clips ─────► rotate ─────────────────────┘                                 └► OpusLooper
//! ```
//!
//! Every looper replays a pre-encoded clip forever. The transport pulls
//! samples on its own schedule, either directly through
//! [`looper::SampleProvider`] or paced through [`looper::stream::LooperStream`].

pub mod catalog;
pub mod error;
pub mod factory;
pub mod looper;
pub mod provider;
pub mod resource;
pub mod rotation;
pub mod selector;
pub mod spec;

pub use error::LooperError;
pub use provider::Provider;
