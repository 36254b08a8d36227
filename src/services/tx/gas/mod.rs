pub mod gas_buffer;
pub mod gas_service;

pub use gas_buffer::{add_gas_buffer, add_gas_buffer_hex};
pub use gas_service::{GasEstimate, TxGasService, set_tx_gas};
