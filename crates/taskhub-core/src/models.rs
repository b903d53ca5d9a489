//! Domain models for taskhub.
//!
//! Every tenant-owned record carries a `tenant_id`; that field is the
//! isolation boundary, not any parent pointer.

pub mod activity;
pub mod comment;
pub mod member;
pub mod notification;
pub mod project;
pub mod reference;
pub mod task;
pub mod tenant;
