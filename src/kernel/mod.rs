pub mod call;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod menu;
pub mod options;
pub mod result;
pub mod state;
pub mod telemetry;
