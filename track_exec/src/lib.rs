//! # Tracking library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the tracking exec crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - global state of the exec for one cycle
pub mod data_store;

/// Drive client - sends forward and turn demands to the drivetrain server
pub mod drive_client;

/// Telemetry server - publishes the state of the exec every cycle
pub mod tm_server;

/// Tracking control module - lines the robot up with a fiducial target
pub mod track_ctrl;

/// Vision client - receives detection batches from the vision equipment
pub mod vision_client;
