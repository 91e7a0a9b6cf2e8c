//! Discharge Agent — command routing, reply composition and artifact
//! delivery for generated discharge summaries.

pub mod agent;
pub mod artifacts;
pub mod config;
pub mod email;
pub mod error;
pub mod llm;
pub mod summary;
