//! Background job subsystem.
//!
//! Request paths enqueue typed jobs through the [`JobDispatcher`]; the
//! [`Scheduler`] enqueues periodic sweeps; a [`WorkerPool`] leases jobs from
//! the durable store and runs the handler registered for each kind in the
//! [`HandlerRegistry`]. The queue table is the only channel between them.
//!
//! Delivery is at-least-once. Failed attempts are rescheduled with
//! exponential backoff until the [`RetryPolicy`] ceiling, after which the job
//! is dead-lettered for inspection with the admin CLI.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod retry;
pub mod scheduler;
pub mod worker;

pub use dispatcher::JobDispatcher;
pub use error::{JobError, RegistryError};
pub use handler::{HandlerRegistry, JobHandler};
pub use retry::RetryPolicy;
pub use scheduler::{ScheduleEntry, ScheduleIntervals, Scheduler};
pub use worker::{JobOutcome, Worker, WorkerConfig, WorkerPool};
