//! Configuration utility types.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `error`  | Configuration errors and diagnostics         |
//! | `field`  | Type-safe field paths                        |
//! | `status` | Field status validation                      |

mod error;
mod field;
mod status;

pub use error::{ConfigDiagnostics, ConfigError};
#[cfg(test)]
pub use error::Severity;
pub use field::FieldPath;
pub use status::{FieldStatus, check_field_status};
