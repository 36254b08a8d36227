pub mod block;
pub mod transaction;

pub use block::{BlockLimits, BlockTag, GasAndCollateral};
pub use transaction::{
    SIMPLE_GAS_COST, SIMPLE_GAS_UNITS, SIMPLE_STORAGE_COST, SimulationDebug, SimulationFails, TransactionCategory,
    TxMeta, TxParams,
};
