pub mod export;
pub mod terrain;
