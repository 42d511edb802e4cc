//! Listing aggregation.
//!
//! This module partitions filtered listings by brand or brand/model, computes
//! truncated mean prices and mileages, compares damaged listings against their
//! brand/model baseline, and assembles everything into a [`types::Report`].

pub mod aggregate;
pub mod analyzer;
pub mod damage;
pub mod types;
pub mod utility;
