// Adapters layer: concrete implementations of the persistence port.

pub mod local_store;
pub mod memory_store;
