pub mod error;
pub mod ray;
