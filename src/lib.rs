pub mod actors;
pub mod cli;
pub mod error;
pub mod models;
pub mod remote;
pub mod render;
pub mod types;
