pub mod error;

pub use error::{AppError, GasEstimationError};
