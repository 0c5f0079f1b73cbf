pub mod color;
pub mod conflict;
pub mod export;
pub mod statistics;
