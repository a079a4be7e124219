//! Control plane - register read/write transactions.
//!
//! Control transactions bypass the frame pool. Each one addresses a single
//! 32-bit register and occupies one SPI exchange of its own; the scheduler
//! never mixes them with data chunks.
//!
//! In protected mode every value travels together with its bitwise
//! complement so that single-bit corruption is caught on the host side.
//!
//! # Example
//!
//! ```
//! use oa_tc6::control::{regs, ControlTransaction, CTRL_BUF_SIZE};
//!
//! let txn = ControlTransaction::write(regs::CONFIG0, 0x0000_1000);
//! let mut buf = [0u8; CTRL_BUF_SIZE];
//! let len = txn.encode(&mut buf, true);
//! assert_eq!(len, 16);
//! ```

mod register;
mod transaction;

pub use register::{regs, RegAddr};
pub use transaction::{
    exchange_len, ControlOp, ControlTransaction, CTRL_BUF_SIZE, ECHO_OFFSET, VALUE_OFFSET,
};
