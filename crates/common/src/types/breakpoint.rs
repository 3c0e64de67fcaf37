// DBV - Debugger View Panel
// Copyright (C) 2024 the DBV contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::{fmt::Display, path::PathBuf, str::FromStr};

use eyre::{bail, eyre, Error, Result};
use serde::{Deserialize, Serialize};

use crate::normalize_expression;

/// A breakpoint set in a source file, with an optional condition.
///
/// The condition, when present, must evaluate to true in the debuggee for the
/// breakpoint to trigger. Condition text is stored in normalized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceBreakpoint {
    /// Path to the source file.
    pub path: PathBuf,
    /// Line number in the source file (1-based).
    pub line: usize,
    /// Optional condition expression that must evaluate to true to trigger.
    pub condition: Option<String>,
    /// Whether the breakpoint is currently enabled.
    pub enabled: bool,
}

impl SourceBreakpoint {
    /// Creates an enabled breakpoint at the given location.
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self { path: path.into(), line, condition: None, enabled: true }
    }

    /// Sets the condition of the breakpoint, normalizing its whitespace.
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(normalize_expression(condition));
        self
    }

    /// Updates the condition in place.
    pub fn set_condition(&mut self, condition: &str) {
        self.condition = Some(normalize_expression(condition));
    }
}

impl Display for SourceBreakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)?;
        if let Some(cond) = &self.condition {
            write!(f, " if {cond}")?;
        }
        Ok(())
    }
}

impl FromStr for SourceBreakpoint {
    type Err = Error;

    /// Parses a breakpoint from a string.
    /// Format: `<path>:<line> [if <condition>]`
    /// Examples:
    /// - `src/main.c:42`
    /// - `src/main.c:42 if x > 10`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty breakpoint specification");
        }

        let (location, condition) = match trimmed.split_once(" if ") {
            Some((loc, cond)) => {
                let cond = normalize_expression(cond);
                if cond.is_empty() {
                    bail!("Empty breakpoint condition");
                }
                (loc.trim(), Some(cond))
            }
            None => (trimmed, None),
        };

        // The path itself may contain colons, so take the last segment as the line.
        let (path, line) = location
            .rsplit_once(':')
            .ok_or_else(|| eyre!("Invalid breakpoint location. Expected <path>:<line>, got: {location}"))?;
        if path.is_empty() {
            bail!("Invalid breakpoint location. Missing path in: {location}");
        }
        let line = line.trim().parse::<usize>().map_err(|e| eyre!("Invalid line number: {e}"))?;
        if line == 0 {
            bail!("Line numbers are 1-based");
        }

        Ok(Self { path: PathBuf::from(path), line, condition, enabled: true })
    }
}
