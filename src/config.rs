//! Link configuration.
//!
//! [`Tc6Config`] carries every tunable of one TC6 link: pool sizes, the
//! maximum frame size, the per-exchange chunk burst and the scheduler's
//! iteration cap. Unset JSON fields fall back to the defaults below.
//!
//! # Example
//!
//! ```
//! use oa_tc6::Tc6Config;
//!
//! let config = Tc6Config::from_json(r#"{ "rx_buffers": 8, "protected_spi": true }"#).unwrap();
//! assert_eq!(config.rx_buffers, 8);
//! assert_eq!(config.tx_buffers, 4);
//!
//! let config = Tc6Config::default().with_max_iterations(2);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, Tc6Error};
use crate::protocol::{CHUNK_PAYLOAD_SIZE, CHUNK_SIZE, MAX_CREDIT};

/// Default number of TX frame buffers.
pub const DEFAULT_TX_BUFFERS: usize = 4;

/// Default number of RX frame buffers.
pub const DEFAULT_RX_BUFFERS: usize = 4;

/// Default frame buffer size (a full Ethernet frame with some headroom).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1536;

/// Default chunk burst per SPI exchange.
pub const DEFAULT_MAX_CHUNKS_PER_XFER: usize = 31;

/// Default scheduler iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Configuration of one TC6 link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tc6Config {
    /// Number of TX frame buffers.
    pub tx_buffers: usize,
    /// Number of RX frame buffers.
    pub rx_buffers: usize,
    /// Capacity of each frame buffer in bytes.
    pub max_frame_size: usize,
    /// Maximum data chunks in one SPI exchange.
    pub max_chunks_per_xfer: usize,
    /// Maximum data exchanges per scheduler call.
    pub max_iterations: usize,
    /// Start in protected control mode.
    pub protected_spi: bool,
}

impl Default for Tc6Config {
    fn default() -> Self {
        Self {
            tx_buffers: DEFAULT_TX_BUFFERS,
            rx_buffers: DEFAULT_RX_BUFFERS,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_chunks_per_xfer: DEFAULT_MAX_CHUNKS_PER_XFER,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            protected_spi: false,
        }
    }
}

impl Tc6Config {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of TX frame buffers.
    ///
    /// Default: 4
    pub fn with_tx_buffers(mut self, count: usize) -> Self {
        self.tx_buffers = count;
        self
    }

    /// Set the number of RX frame buffers.
    ///
    /// Default: 4
    pub fn with_rx_buffers(mut self, count: usize) -> Self {
        self.rx_buffers = count;
        self
    }

    /// Set the frame buffer capacity.
    ///
    /// Default: 1536
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the maximum chunk burst per SPI exchange.
    ///
    /// Default: 31
    pub fn with_max_chunks_per_xfer(mut self, chunks: usize) -> Self {
        self.max_chunks_per_xfer = chunks;
        self
    }

    /// Set the scheduler iteration cap.
    ///
    /// Default: 8
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Select protected control transactions.
    ///
    /// Default: false
    pub fn with_protected_spi(mut self, protected: bool) -> Self {
        self.protected_spi = protected;
        self
    }

    /// Chunks needed to carry one maximum-size frame.
    pub fn chunks_per_frame(&self) -> usize {
        (self.max_frame_size + CHUNK_PAYLOAD_SIZE - 1) / CHUNK_PAYLOAD_SIZE
    }

    /// Size of the data scratch buffer in bytes.
    pub fn data_buffer_len(&self) -> usize {
        self.max_chunks_per_xfer * CHUNK_SIZE
    }

    /// Check the configuration for values the link cannot run with.
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("tx_buffers", self.tx_buffers),
            ("rx_buffers", self.rx_buffers),
            ("max_frame_size", self.max_frame_size),
            ("max_chunks_per_xfer", self.max_chunks_per_xfer),
            ("max_iterations", self.max_iterations),
        ];
        if let Some((name, _)) = nonzero.iter().find(|(_, value)| *value == 0) {
            return Err(Tc6Error::Config(format!("{name} must be non-zero")));
        }
        if self.max_chunks_per_xfer > MAX_CREDIT as usize {
            return Err(Tc6Error::Config(format!(
                "max_chunks_per_xfer {} exceeds the {} chunk credit limit",
                self.max_chunks_per_xfer, MAX_CREDIT
            )));
        }
        if self.chunks_per_frame() > self.max_chunks_per_xfer {
            return Err(Tc6Error::Config(format!(
                "a {} byte frame needs {} chunks but only {} fit in one exchange",
                self.max_frame_size,
                self.chunks_per_frame(),
                self.max_chunks_per_xfer
            )));
        }
        Ok(())
    }
}
