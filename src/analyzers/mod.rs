//! Delay aggregation and vendor comparison.
//!
//! This module groups enriched delays by vendor and month, computes both
//! fleet-size notions, and estimates the counterfactual reduction from a
//! vendor substitution.

pub mod aggregate;
pub mod types;
pub mod utility;
