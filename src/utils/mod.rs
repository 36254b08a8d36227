pub mod address;
pub mod convert;
pub mod logger;

pub use address::*;
pub use convert::*;
