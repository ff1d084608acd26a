#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod models;
pub mod nodes;
pub mod pixels;
pub mod values;

pub use error::{NodeError, ResolveError, Result};
