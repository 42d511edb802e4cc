pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod listing;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod stats;
