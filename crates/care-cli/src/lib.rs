//! Command-line front end for the patient identity resolution engine.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod report;
