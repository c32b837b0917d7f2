//! Domain types, pure eligibility and routing rules, and the ports through
//! which the application layer reaches its collaborators.

pub mod catalog;
pub mod checkout;
pub mod money;
pub mod ports;
pub mod routing;
pub mod rules;
pub mod transaction;
pub mod vendor;
