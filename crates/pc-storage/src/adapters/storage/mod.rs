pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocksdb_adapter;

pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_adapter::RocksDbStore;
