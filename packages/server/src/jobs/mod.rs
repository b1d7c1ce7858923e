//! Job orchestration: model, queue operations, dispatcher and worker loop.
//!
//! ```text
//! createJob(type, payload)          processNextJob()
//!         |                               |
//!         v                               v
//!     RecordStore  <-- claim_next --  JobQueue
//!                                        |
//!                          dispatch by type to a stage
//!                                        |
//!                          complete(result) / fail(error)
//! ```
//!
//! Failures are terminal: there is no retry machinery here, by design. An
//! external scheduler that wants a retry creates a fresh job.

mod job;
mod queue;
mod runner;
mod worker;

pub use job::{Job, JobPatch, JobStatus, JobType};
pub use queue::JobQueue;
pub use runner::{process_next_job, ProcessOutcome};
pub use worker::Worker;
