pub mod app;
pub mod backend;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod input;
pub mod perf;
pub mod presenter;
pub mod render;

#[cfg(test)]
mod test_support;
