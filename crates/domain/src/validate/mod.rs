//! Startup configuration checks.

pub mod site;
