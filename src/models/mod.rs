pub mod medication;
pub mod prescription;

pub use medication::*;
pub use prescription::*;
