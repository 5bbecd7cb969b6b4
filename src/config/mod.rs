// Re-export all items from the submodules
mod collection_config;
mod env_vars;

// Re-export collector config
pub use collection_config::{
    CollectorConfig,
    load_config,
    load_config_with,
};

// Re-export environment variable helpers
pub use env_vars::{
    expand_unix_vars,
    is_truthy,
};
