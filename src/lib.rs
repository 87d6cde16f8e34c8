pub mod analyzers;
pub mod calendar;
pub mod config;
pub mod error;
pub mod fetch;
pub mod matcher;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod sources;

pub use error::{Error, Result};
