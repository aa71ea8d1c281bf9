//! Zoomlens Core - optics math, command ingestion, and zoom control
//!
//! This crate provides the numeric core of the zoomlens system:
//! - Rectilinear lens conversions between field of view, focal length,
//!   and sensor width
//! - A lock-free latch that coalesces asynchronously delivered zoom commands
//! - A goal-tracking controller that converges the lens toward the commanded
//!   zoom factor at a bounded slew rate, one simulation tick at a time

pub mod command;
pub mod controller;
pub mod optics;

pub use command::CommandLatch;
pub use controller::{ConfigError, LensState, ZoomConfig, ZoomController, MIN_ZOOM};
