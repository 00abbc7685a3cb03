//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the data
//! exchanged with the vision and drive equipment, and the network layer used
//! to carry it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data definitions for equipment (vision sensor, drivetrain)
pub mod eqpt;

/// Network module
pub mod net;
