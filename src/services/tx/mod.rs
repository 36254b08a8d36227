pub mod category;
pub mod gas;
