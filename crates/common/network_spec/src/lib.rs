pub mod engine;
pub mod networks;
