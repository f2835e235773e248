//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, created with defaults when missing)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → routes built into a frozen Router
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → route table sent only if it changed
//!     → new Router frozen and swapped in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_create, ConfigError};
pub use schema::AppConfig;
pub use schema::CompressionConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RouteConfig;
pub use schema::TlsConfig;
pub use validation::ValidationError;
pub use watcher::RouteWatcher;
