//! Application layer: the selection history engine and its persistence.

pub mod history;
pub mod host;
pub mod listener;
pub mod notify;
pub mod path;
pub mod restore;
pub mod session;
pub mod store;
pub mod view;
