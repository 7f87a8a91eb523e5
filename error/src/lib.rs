pub mod error;

pub use error::HospitalError;
