pub mod analytics;
pub mod app;
pub mod cache;
pub mod config;
pub mod coordinates;
pub mod credentials;
pub mod error;
pub mod geocode;
pub mod pages;
pub mod realtime;
pub mod resolve;
pub mod types;
