pub mod config;
pub mod fetch;
pub mod markers;
pub mod model;
pub mod output;
pub mod overlay;
pub mod parser;
pub mod pipeline;
pub mod traffic;
