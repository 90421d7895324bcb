pub mod core;
pub mod distributions;
pub mod slice;
