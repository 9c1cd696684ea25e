//! Discrete-time PID control for cyclic, resource-constrained loops.
//!
//! The controller borrows the caller's measurement, output, and setpoint,
//! runs at most once per sample period no matter how often it is polled, and
//! keeps its output continuous across mode and tuning changes.
#![cfg_attr(not(test), no_std)]

pub mod pid;
