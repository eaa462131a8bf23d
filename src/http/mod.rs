//! HTTP server wrapper around the dispatch chain.

pub mod server;

pub use server::HttpServer;
