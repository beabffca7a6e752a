//! Route handlers

pub mod dashboard;
pub mod history;
pub mod sensors;
