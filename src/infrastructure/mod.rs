//! Adapters for the domain ports: in-memory stores, an optional RocksDB
//! transaction store, a JSON-backed catalog and a scripted vendor gateway.

pub mod catalog;
pub mod fixture;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod scripted_vendor;
