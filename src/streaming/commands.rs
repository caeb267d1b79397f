// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Orders received on the module's command topic

use serde::Deserialize;
use thiserror::Error;

/// An order addressed to the luminosity module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Publish the status snapshot
    Status,
    /// Publish every valid value now
    Acquire,
    /// Change the cooldown, in seconds
    Frequency(i64),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("malformed command: {0}")]
    Malformed(String),

    #[error("unknown order '{0}'")]
    Unknown(String),

    #[error("order '{0}' needs a value")]
    MissingValue(&'static str),
}

#[derive(Debug, Deserialize)]
struct Command {
    order: String,
    #[serde(default)]
    value: Option<i64>,
}

impl Order {
    /// Parse `{"order": "...", "value": n}`. Extra keys such as `dest` are ignored.
    pub fn parse(payload: &[u8]) -> Result<Self, OrderError> {
        let command: Command =
            serde_json::from_slice(payload).map_err(|e| OrderError::Malformed(e.to_string()))?;

        match command.order.as_str() {
            "status" => Ok(Order::Status),
            "acquire" => Ok(Order::Acquire),
            "frequency" => command
                .value
                .map(Order::Frequency)
                .ok_or(OrderError::MissingValue("frequency")),
            other => Err(OrderError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orders() {
        assert_eq!(Order::parse(br#"{"order": "status"}"#), Ok(Order::Status));
        assert_eq!(Order::parse(br#"{"dest": "all", "order": "acquire"}"#), Ok(Order::Acquire));
        assert_eq!(
            Order::parse(br#"{"value": 120, "order": "frequency"}"#),
            Ok(Order::Frequency(120))
        );
    }

    #[test]
    fn test_frequency_needs_value() {
        assert_eq!(
            Order::parse(br#"{"order": "frequency"}"#),
            Err(OrderError::MissingValue("frequency"))
        );
    }

    #[test]
    fn test_rejects_unknown_and_garbage() {
        assert_eq!(
            Order::parse(br#"{"order": "reboot"}"#),
            Err(OrderError::Unknown("reboot".to_string()))
        );
        assert!(matches!(Order::parse(b"not json"), Err(OrderError::Malformed(_))));
    }
}
