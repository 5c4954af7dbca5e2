//! Feature modules of the monitor UI.
//!
//! Each feature owns its state slice and the logic that acts on it; the
//! top-level reducer composes them.

pub mod form;
pub mod modal;
pub mod panels;
pub mod search;
pub mod workflow;
