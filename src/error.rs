// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Error types for the sensing core

use thiserror::Error;

use crate::sensors::SlotId;

/// Shorthand for results produced by the sensing core.
pub type LumiResult<T> = Result<T, LumiError>;

/// Failure talking to a chip over the register bus.
///
/// Always recoverable: the slot is marked invalid for the cycle and retried
/// once its cooldown elapses again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("read of register {reg:#04x} at address {addr:#04x} failed: {reason}")]
    Read { addr: u8, reg: u8, reason: String },

    #[error("write of register {reg:#04x} at address {addr:#04x} failed: {reason}")]
    Write { addr: u8, reg: u8, reason: String },

    #[error("bus unavailable: {0}")]
    Io(String),
}

/// Errors surfaced by the luminosity manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LumiError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("no recognized light sensor at address {0:#04x}")]
    UnrecognizedDevice(u8),

    #[error("sensor capacity exceeded ({0} slots)")]
    CapacityExceeded(usize),

    #[error("address {0:#04x} is already handled by another slot")]
    AlreadyRegistered(u8),

    #[error("unknown sensor slot {0}")]
    UnknownSlot(SlotId),

    /// The sample was saturated or its channel ratio undefined.
    #[error("sample unusable for lux conversion")]
    ConversionInvalid,
}
