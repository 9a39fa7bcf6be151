//! Terminal output helpers
//!
//! Steps and spinners write to stderr so stdout stays reserved for values
//! scripts consume, such as environment paths and hashes. Key-value lines
//! are part of command output and go to stdout.
//! Spinners and colors are used in interactive terminals only; CI and
//! piped runs get plain, prefixed lines.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, key_value_status, step_info, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
