pub mod adapter;
pub mod classifier;
