pub mod core;
pub mod surface;
