pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

pub use app::history::{HistoryOptions, SelectionHistory};

pub fn init(config: &infra::config::Config) {
    infra::logging::init(&config.logging);
}
