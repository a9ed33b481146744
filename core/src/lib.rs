pub mod analysis;
pub mod config;
pub mod dataset;
pub mod models;
pub mod recommend;
pub mod service;
pub mod session;
