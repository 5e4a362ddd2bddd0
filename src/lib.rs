pub mod config;
pub mod error;
pub mod kernel;
pub mod query;
pub mod services;
pub mod store;
pub mod transport;

// Re-export specific items if needed for convenient access
pub use config::ProcessorConfig;
pub use kernel::reactor::Reactor;
