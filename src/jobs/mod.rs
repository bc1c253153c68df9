//! # Jobs, results and handlers.
//!
//! This module provides the data model flowing through the pool:
//! - [`Job`] - unit of work (id, payload, submission timestamp)
//! - [`JobId`] - identifier, allocated by the pool or supplied by the caller
//! - [`JobResult`] - exactly one per accepted job
//! - [`Handler`] - trait executing a job payload
//! - [`JobFn`] - closure-backed handler, [`HandlerRef`] shared handle

mod handler;
mod job;
mod result;

pub use handler::{BoxJobFuture, Handler, HandlerRef, JobContext, JobFn};
pub use job::{Job, JobId};
pub use result::JobResult;
