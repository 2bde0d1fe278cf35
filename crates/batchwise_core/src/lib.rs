//! Ambient infrastructure shared by batchwise binaries and tests.
//!
//! - **Logging** ([`logging`]): [`LoggingConfig`] installs a `tracing`
//!   subscriber scoped to the batchwise crates, configurable in code or from
//!   `BATCHWISE_LOG*` environment variables

pub mod logging;

pub use logging::{LogFormat, LoggingConfig, LoggingError};
