pub mod client;
pub mod memory;
pub mod valkey;

pub use client::{CacheClient, CacheError, CacheResult};
pub use memory::MemoryCacheClient;
pub use valkey::ValkeyClient;
