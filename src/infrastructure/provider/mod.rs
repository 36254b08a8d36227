pub mod conflux_provider;
mod retry_adapter;

#[cfg(test)]
pub use conflux_provider::MockProviderTrait;
pub use conflux_provider::{ConfluxProvider, ProviderTrait};
pub use retry_adapter::RetryAdapter;
