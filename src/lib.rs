#![forbid(unsafe_code)]

pub use rootrpc;

pub mod app;
pub mod client;
pub mod controller;
pub mod errors;
pub mod export;
pub mod receipt;
pub mod ui;
