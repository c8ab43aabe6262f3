//! Data types for the annotation pipeline.

pub mod config;
pub mod record;
