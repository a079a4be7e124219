//! Error types for oa-tc6.

use thiserror::Error;

use crate::pool::FrameState;

/// Failure reported by an [`SpiTransport`](crate::transport::SpiTransport).
///
/// Kept separate from [`Tc6Error`] so transport implementations do not
/// need to know about the protocol engine.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from an OS-backed SPI device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bus-level failure reported by the SPI controller.
    #[error("SPI bus error: {0}")]
    Bus(String),
}

/// Main error type for all TC6 operations.
#[derive(Debug, Error)]
pub enum Tc6Error {
    /// The SPI exchange failed; the transaction was abandoned.
    #[error("SPI transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protected control read whose value and complement disagree.
    #[error(
        "Integrity error on register {addr:#010x}: value {value:#010x}, complement {complement:#010x}"
    )]
    Integrity {
        /// Packed register address.
        addr: u32,
        /// Value word as received.
        value: u32,
        /// Complement word as received.
        complement: u32,
    },

    /// The MAC-PHY echoed a different control header than the one sent.
    #[error("Control header echo mismatch: sent {sent:#010x}, echoed {echoed:#010x}")]
    ControlEcho {
        /// Header word sent.
        sent: u32,
        /// Header word echoed back.
        echoed: u32,
    },

    /// Every buffer of the requested pool is in use.
    #[error("No buffers available")]
    NoBuffersAvailable,

    /// No completed receive frame matches the request.
    #[error("No frame available")]
    NoFrameAvailable,

    /// A frame buffer was handed back in the wrong state.
    #[error("Invalid frame buffer state: expected {expected:?}, found {found:?}")]
    InvalidState {
        /// State the operation requires.
        expected: FrameState,
        /// State the buffer was actually in.
        found: FrameState,
    },

    /// Frame length of zero or above the configured maximum.
    #[error("Invalid frame length {len} (max {max})")]
    InvalidLength {
        /// Submitted length.
        len: usize,
        /// Configured maximum frame size.
        max: usize,
    },

    /// A control transaction is already outstanding.
    #[error("Control transaction already outstanding")]
    ControlBusy,

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using Tc6Error.
pub type Result<T> = std::result::Result<T, Tc6Error>;
