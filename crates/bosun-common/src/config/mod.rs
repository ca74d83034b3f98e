mod application;
mod loader;

/// A single configuration entry forwarded to remote processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd)]
pub struct ConfigKeyValue {
    pub key: String,
    pub value: Option<String>,
}

pub use application::*;
