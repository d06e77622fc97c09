pub mod assets;
pub mod check;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod pages;
pub mod panel;
pub mod processing;
pub mod render;
pub mod server;
pub mod session;
pub mod types;
