// The binary in main.rs drives the terminal; everything it renders or
// mutates lives here so integration tests and benches can reach it.

pub mod app;
pub mod config;
pub mod content;
pub mod engine;
pub mod event;
pub mod navigation;
pub mod pointer;
pub mod session;
pub mod store;
pub mod ui;
