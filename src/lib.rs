//! Vertiport Shuttle Simulation Library
//!
//! A discrete-event simulation of battery-limited aircraft shuttling
//! passengers between vertiports, for comparing dispatch policies.

pub mod simulation;
