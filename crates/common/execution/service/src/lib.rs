pub mod builder;
pub mod cache;
pub mod dispatch;
pub mod errors;
pub mod service;
pub mod state;
