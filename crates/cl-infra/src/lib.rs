pub mod entry_store;
pub mod settings;
pub mod static_config;

pub use entry_store::InMemoryEntryStore;
pub use settings::load_settings;
pub use static_config::load_static_config;
