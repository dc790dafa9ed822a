pub mod engine;
pub mod file;
pub mod memory;

pub use engine::DataStore;
pub use file::FileDataStore;
pub use memory::MemoryDataStore;
