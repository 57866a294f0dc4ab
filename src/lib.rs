//! Nested d'Hondt apportionment of electoral pacts, lists and candidacies,
//! and what-if simulation of two pacts running as one.

pub mod config;
pub mod formats;
pub mod model;
pub mod normalizers;
pub mod reports;
pub mod scenario;
pub mod tabulator;
pub mod util;
