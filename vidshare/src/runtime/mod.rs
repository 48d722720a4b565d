//! Lua scripts backing the Redis store's atomic mutations.

pub mod executor;
pub mod scripts;

pub use executor::invoke_script;
