//! # Controller
//!
//! Core controller modules for the Parameter Store Controller.
//!
//! - `reconciler`: resolution, synthesis and status logic plus the kube-rs entry points
//! - `watch`: trigger stream that skips status-only updates

pub mod reconciler;
pub mod watch;
