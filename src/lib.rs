pub mod cli;
pub mod config;
pub mod io;
pub mod logging;
pub mod resolver;
pub mod result;
pub mod service;
pub mod types;
pub mod web;
pub mod youtube_url;
