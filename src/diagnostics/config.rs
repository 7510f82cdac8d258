use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects which lines of source code a compiler stage will emit trace
/// events for.  Lines are 1-based and ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracingConfig {
    All,
    Between(usize, usize),
    Before(usize),
    After(usize),
    Only(usize),
    Off,
}

impl Default for TracingConfig {
    fn default() -> Self {
        TracingConfig::Off
    }
}

impl TracingConfig {
    /// Returns true if events on `line` should be traced.
    pub fn includes(&self, line: usize) -> bool {
        match *self {
            TracingConfig::All => true,
            TracingConfig::Between(start, end) => start <= line && line <= end,
            TracingConfig::Before(end) => line <= end,
            TracingConfig::After(start) => line >= start,
            TracingConfig::Only(ln) => line == ln,
            TracingConfig::Off => false,
        }
    }

    pub fn is_off(&self) -> bool {
        *self == TracingConfig::Off
    }
}

impl FromStr for TracingConfig {
    type Err = String;

    /// Parses the command line form of a tracing range:
    /// `all`, `off`, `<n>`, `<a>:<b>`, `:<b>`, or `<a>:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_line = |l: &str| {
            l.trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid line number in trace range: {}", l))
        };

        match s.trim() {
            "all" => Ok(TracingConfig::All),
            "off" => Ok(TracingConfig::Off),
            range => match range.find(':') {
                None => Ok(TracingConfig::Only(parse_line(range)?)),
                Some(idx) => {
                    let (start, end) = (&range[..idx], &range[idx + 1..]);
                    match (start.is_empty(), end.is_empty()) {
                        (true, true) => Ok(TracingConfig::All),
                        (true, false) => Ok(TracingConfig::Before(parse_line(end)?)),
                        (false, true) => Ok(TracingConfig::After(parse_line(start)?)),
                        (false, false) => Ok(TracingConfig::Between(
                            parse_line(start)?,
                            parse_line(end)?,
                        )),
                    }
                }
            },
        }
    }
}

/// Per stage tracing configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTracing {
    pub lexer: TracingConfig,
    pub parser: TracingConfig,
    pub semantics: TracingConfig,
}
