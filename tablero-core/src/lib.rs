pub mod position;
pub mod storage;
pub mod types;
