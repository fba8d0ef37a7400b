pub mod api;
pub mod board;
pub mod config;
pub mod error;
pub mod models;
pub mod priority;
pub mod services;
pub mod state;
pub mod store;
