//! MineGuard Environment Abstraction Layer
//!
//! This crate provides the seams between the pure hazard engines and the
//! outside world, so the same caller code runs against the **Production**
//! (tokio, wall clock) and **Simulation** (virtual clock) environments.
//!
//! # What is intercepted
//!
//! - Time (`now()`, `utc_now()`, `sleep()`)
//! - Outbound notifications (`publish()`)
//!
//! Hazard simulation itself never touches either: the caller reads the clock,
//! passes the instant in, and publishes whatever events come out.
//!
//! # Example
//!
//! ```ignore
//! use mineguard_env::{MineGuardContext, NotificationSink, EventEnvelope};
//!
//! async fn announce<Ctx: MineGuardContext, Sink: NotificationSink>(
//!     ctx: &Ctx,
//!     sink: &Sink,
//!     payload: serde_json::Value,
//! ) {
//!     let envelope = EventEnvelope::new("new-hazard", payload, ctx.utc_now());
//!     if let Err(e) = sink.publish(envelope).await {
//!         eprintln!("publish failed: {e}");
//!     }
//! }
//! ```

mod context;
mod notify;
mod types;
mod error;
mod tokio_impl;

pub use context::MineGuardContext;
pub use notify::NotificationSink;
pub use types::{HazardId, EventEnvelope};
pub use error::EnvError;
pub use tokio_impl::{TokioContext, BroadcastNotifier};
