pub mod block;
pub mod da;
pub mod errors;
pub mod service;
