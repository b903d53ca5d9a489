//! taskhub core: domain types shared by every other crate.
//!
//! Nothing in here performs I/O. Storage lives behind the traits in
//! [`repository`]; the workflow crate drives them.

pub mod error;
pub mod mention;
pub mod models;
pub mod permission;
pub mod repository;
pub mod workflow;
