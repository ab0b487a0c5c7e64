pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod limiter;
pub mod model;
pub mod names;
pub mod output;
pub mod rank;
pub mod storage;
pub mod store;
pub mod view;

#[cfg(test)]
mod tests;
