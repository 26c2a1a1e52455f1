pub mod cache;
pub mod series;
