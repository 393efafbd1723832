//! Domain types shared by the history engine and its hosts.

pub mod errors;
pub mod model;
