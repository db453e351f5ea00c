pub mod aggregation;
pub mod api;
pub mod app;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod importers;
pub mod selection;
pub mod services;
pub mod utils;
