//! Tools used for reporting what the compiler is doing and the non-fatal
//! findings it makes along the way.  Fatal problems are reported through
//! [`CompileError`](crate::compiler::CompileError); everything here is
//! informational and never stops a compilation.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::compiler::Position;

pub mod config;

pub use config::{StageTracing, TracingConfig};

/// Emits a `log::trace!` event labelled with the calling function when
/// `$config` includes `$line`.
#[macro_export]
macro_rules! trace {
    ($config:expr, $line:expr, $($arg:tt)+) => {
        if $config.includes($line as usize) {
            log::trace!(
                "{} <- L{}: {}",
                stdext::function_name!(),
                $line,
                format_args!($($arg)+)
            )
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A non-fatal finding about the program, such as an operator which has no
/// effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn warning(message: String, position: Option<Position>) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            message,
            position,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(pos) => f.write_fmt(format_args!(
                "{} at ({}): {}",
                self.severity, pos, self.message
            )),
            None => f.write_fmt(format_args!("{}: {}", self.severity, self.message)),
        }
    }
}
