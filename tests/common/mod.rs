//! Common test utilities for dhtx integration tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod swarm;

#[allow(unused_imports)]
pub use assertions::*;
pub use swarm::*;
