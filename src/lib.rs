#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod project;
pub mod transcript;
