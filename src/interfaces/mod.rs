//! Adapters between the gateway and the outside world.

pub mod csv;
