//! The collection of implemented inner solvers.

pub mod sqp;

pub use sqp::ByrdOmojokun;
