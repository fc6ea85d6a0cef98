//! Load balancer implementations.

pub mod compress;
