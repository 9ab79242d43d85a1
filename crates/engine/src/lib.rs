//! Broadcast engine: delivery-state tracking, batched fan-out, and the
//! cancellable timed schedule that drives cycles.

pub mod fanout;
pub mod scheduler;
pub mod state;

pub use fanout::{BroadcastTransport, CycleReport, FanoutExecutor};
pub use scheduler::{Scheduler, StartOutcome, StopOutcome};
pub use state::DeliveryState;
