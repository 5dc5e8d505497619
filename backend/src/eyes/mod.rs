pub mod adapter;
pub mod detector;
