//! Provisioning policy implementations.

pub mod brute_force;
