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

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The result of evaluating an expression against the debuggee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluatedValue {
    /// Rendered value as reported by the adapter.
    pub value: String,
    /// Type of the value, if the adapter reported one.
    pub type_name: Option<String>,
}

impl EvaluatedValue {
    /// Creates an untyped value.
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), type_name: None }
    }

    /// Attaches a type name to the value.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

impl Display for EvaluatedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.type_name {
            Some(ty) => write!(f, "{}: {ty}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_untyped() {
        assert_eq!(EvaluatedValue::new("42").to_string(), "42");
    }

    #[test]
    fn test_display_typed() {
        assert_eq!(EvaluatedValue::new("42").with_type("i32").to_string(), "42: i32");
    }
}
