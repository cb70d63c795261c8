pub mod config;
pub mod logging;

pub mod listener;
pub mod recorder;
pub mod referer;
pub mod session;
pub mod view_db;
