pub mod cliopt;
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod parser;
pub mod query;
pub mod runner;
