pub mod api;
pub mod client;
pub mod config;
pub mod data_models;
pub mod debounce;
pub mod elastic;
pub mod indexer;
pub mod render;
pub mod widget;
