//! Wire format encoding and decoding.
//!
//! Every TC6 header and footer is a single 32-bit big-endian word:
//! ```text
//! data header (host -> MAC-PHY)
//! ┌───┬───┬────┬─────┬────┬────┬────┬─────┬───┬────┬─────┬───┬───┐
//! │DNC│SEQ│NORX│ rsv │ VS │ DV │ SV │ SWO │rsv│ EV │ EBO │TSC│ P │
//! │31 │30 │ 29 │28:24│23:22│21 │ 20 │19:16│15 │ 14 │13:8 │7:6│ 0 │
//! └───┴───┴────┴─────┴────┴────┴────┴─────┴───┴────┴─────┴───┴───┘
//! data footer (MAC-PHY -> host)
//! ┌────┬────┬────┬─────┬────┬────┬────┬─────┬───┬────┬─────┬────┬────┬───┬───┐
//! │EXST│HDRB│SYNC│ RCA │ VS │ DV │ SV │ SWO │FD │ EV │ EBO │RTSA│RTSP│TXC│ P │
//! │ 31 │ 30 │ 29 │28:24│23:22│21 │ 20 │19:16│15 │ 14 │13:8 │ 7  │ 6  │5:1│ 0 │
//! └────┴────┴────┴─────┴────┴────┴────┴─────┴───┴────┴─────┴────┴────┴───┴───┘
//! control header
//! ┌───┬────┬───┬───┬─────┬──────┬─────┬───┐
//! │DNC│HDRB│WNR│AID│ MMS │ ADDR │ LEN │ P │
//! │31 │ 30 │29 │28 │27:24│ 23:8 │ 7:1 │ 0 │
//! └───┴────┴───┴───┴─────┴──────┴─────┴───┘
//! ```
//!
//! Bit 0 of every word is an odd parity bit over the other 31 bits.

/// Payload bytes carried by one data chunk.
pub const CHUNK_PAYLOAD_SIZE: usize = 64;

/// Size of a data header (TX) or data footer (RX).
pub const HEADER_SIZE: usize = 4;

/// Size of a control header.
pub const CTRL_HEADER_SIZE: usize = 4;

/// Size of one register value in a control transaction.
pub const REG_SIZE: usize = 4;

/// Bytes one chunk occupies on the wire, in either direction.
pub const CHUNK_SIZE: usize = HEADER_SIZE + CHUNK_PAYLOAD_SIZE;

/// Largest value of the 5-bit TXC and RCA credit fields.
pub const MAX_CREDIT: u32 = 31;

/// Bit positions and masks of the 32-bit words.
pub mod bits {
    /// Data-not-control flag (headers and control headers).
    pub const DNC: u32 = 1 << 31;
    /// Sequence toggle (data header).
    pub const SEQ: u32 = 1 << 30;
    /// Host cannot accept RX data (data header).
    pub const NORX: u32 = 1 << 29;
    /// Vendor-specific tag shift.
    pub const VS_SHIFT: u32 = 22;
    /// Vendor-specific tag mask (unshifted).
    pub const VS_MASK: u32 = 0x3;
    /// Data valid.
    pub const DV: u32 = 1 << 21;
    /// Start valid.
    pub const SV: u32 = 1 << 20;
    /// Start word offset shift.
    pub const SWO_SHIFT: u32 = 16;
    /// Start word offset mask (unshifted).
    pub const SWO_MASK: u32 = 0xF;
    /// Frame drop (footer).
    pub const FD: u32 = 1 << 15;
    /// End valid.
    pub const EV: u32 = 1 << 14;
    /// End byte offset shift.
    pub const EBO_SHIFT: u32 = 8;
    /// End byte offset mask (unshifted).
    pub const EBO_MASK: u32 = 0x3F;
    /// Timestamp capture shift (data header).
    pub const TSC_SHIFT: u32 = 6;
    /// Timestamp capture mask (unshifted).
    pub const TSC_MASK: u32 = 0x3;
    /// Parity bit.
    pub const P: u32 = 1;

    /// Extended status (footer).
    pub const EXST: u32 = 1 << 31;
    /// Header bad (footer and echoed control header).
    pub const HDRB: u32 = 1 << 30;
    /// MAC-PHY configured and synchronised (footer).
    pub const SYNC: u32 = 1 << 29;
    /// Receive chunks available shift (footer).
    pub const RCA_SHIFT: u32 = 24;
    /// Receive chunks available mask (unshifted).
    pub const RCA_MASK: u32 = 0x1F;
    /// RX timestamp added (footer).
    pub const RTSA: u32 = 1 << 7;
    /// RX timestamp parity (footer).
    pub const RTSP: u32 = 1 << 6;
    /// Transmit credits shift (footer).
    pub const TXC_SHIFT: u32 = 1;
    /// Transmit credits mask (unshifted).
    pub const TXC_MASK: u32 = 0x1F;

    /// Write-not-read (control header).
    pub const WNR: u32 = 1 << 29;
    /// Address increment disable (control header).
    pub const AID: u32 = 1 << 28;
    /// Memory map selector shift (control header).
    pub const MMS_SHIFT: u32 = 24;
    /// Memory map selector mask (unshifted).
    pub const MMS_MASK: u32 = 0xF;
    /// Register address shift (control header).
    pub const ADDR_SHIFT: u32 = 8;
    /// Register address mask (unshifted).
    pub const ADDR_MASK: u32 = 0xFFFF;
    /// Register count minus one shift (control header).
    pub const LEN_SHIFT: u32 = 1;
    /// Register count minus one mask (unshifted).
    pub const LEN_MASK: u32 = 0x7F;

    /// Extract a field.
    #[inline]
    pub fn get(word: u32, shift: u32, mask: u32) -> u32 {
        (word >> shift) & mask
    }

    /// Place a field, truncating the value to the field width.
    #[inline]
    pub fn put(value: u32, shift: u32, mask: u32) -> u32 {
        (value & mask) << shift
    }

    /// Check if a flag is set.
    #[inline]
    pub fn has(word: u32, flag: u32) -> bool {
        word & flag != 0
    }
}

/// Parity bit for a header or footer word.
///
/// Computed over bits 31..1 (bit 0 is ignored) so that the complete word,
/// parity bit included, carries an odd number of set bits.
#[inline]
pub fn parity_bit(word: u32) -> u32 {
    ((word >> 1).count_ones() & 1) ^ 1
}

/// Return `word` with its parity bit set correctly.
#[inline]
pub fn with_parity(word: u32) -> u32 {
    (word & !bits::P) | parity_bit(word)
}

/// Check the parity of a received word.
#[inline]
pub fn check_parity(word: u32) -> bool {
    word.count_ones() & 1 == 1
}

/// Read a big-endian word at `offset`.
///
/// # Panics
///
/// Panics if `buf` is shorter than `offset + 4`.
#[inline]
pub fn read_be32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Write a big-endian word at `offset`.
///
/// # Panics
///
/// Panics if `buf` is shorter than `offset + 4`.
#[inline]
pub fn write_be32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Header of one data chunk sent to the MAC-PHY.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataHeader {
    /// Ask the MAC-PHY not to return frame data in this chunk.
    pub norx: bool,
    /// Vendor-specific 2-bit tag.
    pub vs: u8,
    /// Chunk carries frame data.
    pub dv: bool,
    /// A frame starts in this chunk.
    pub sv: bool,
    /// Start word offset (0-15).
    pub swo: u8,
    /// A frame ends in this chunk.
    pub ev: bool,
    /// Offset of the last frame byte in this chunk (0-63).
    pub ebo: u8,
}

impl DataHeader {
    /// Header of an empty chunk that only pulls receive data.
    pub fn empty(norx: bool) -> Self {
        Self {
            norx,
            ..Self::default()
        }
    }

    /// Encode to a 32-bit word with DNC and parity set.
    pub fn to_word(&self) -> u32 {
        let mut word = bits::DNC;
        if self.norx {
            word |= bits::NORX;
        }
        word |= bits::put(self.vs as u32, bits::VS_SHIFT, bits::VS_MASK);
        if self.dv {
            word |= bits::DV;
        }
        if self.sv {
            word |= bits::SV;
        }
        word |= bits::put(self.swo as u32, bits::SWO_SHIFT, bits::SWO_MASK);
        if self.ev {
            word |= bits::EV;
        }
        word |= bits::put(self.ebo as u32, bits::EBO_SHIFT, bits::EBO_MASK);
        with_parity(word)
    }

    /// Decode from a 32-bit word. Parity is not checked.
    pub fn from_word(word: u32) -> Self {
        Self {
            norx: bits::has(word, bits::NORX),
            vs: bits::get(word, bits::VS_SHIFT, bits::VS_MASK) as u8,
            dv: bits::has(word, bits::DV),
            sv: bits::has(word, bits::SV),
            swo: bits::get(word, bits::SWO_SHIFT, bits::SWO_MASK) as u8,
            ev: bits::has(word, bits::EV),
            ebo: bits::get(word, bits::EBO_SHIFT, bits::EBO_MASK) as u8,
        }
    }

    /// Encode into the first four bytes of `buf`.
    pub fn encode_into(&self, buf: &mut [u8]) {
        write_be32(buf, 0, self.to_word());
    }
}

/// Footer of one data chunk received from the MAC-PHY.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataFooter {
    /// Extended status pending in STATUS0/STATUS1.
    pub exst: bool,
    /// The MAC-PHY rejected the matching TX header.
    pub hdrb: bool,
    /// MAC-PHY configuration is in sync.
    pub sync: bool,
    /// Receive chunks available.
    pub rca: u8,
    /// Vendor-specific 2-bit tag.
    pub vs: u8,
    /// Chunk carries frame data.
    pub dv: bool,
    /// A frame starts in this chunk.
    pub sv: bool,
    /// Start word offset (0-15).
    pub swo: u8,
    /// The frame ending in this chunk must be dropped.
    pub fd: bool,
    /// A frame ends in this chunk.
    pub ev: bool,
    /// Offset of the last frame byte in this chunk (0-63).
    pub ebo: u8,
    /// A receive timestamp was added to the frame.
    pub rtsa: bool,
    /// Parity of the receive timestamp.
    pub rtsp: bool,
    /// Transmit credits available.
    pub txc: u8,
}

impl DataFooter {
    /// Decode from a 32-bit word. Parity is not checked.
    pub fn from_word(word: u32) -> Self {
        Self {
            exst: bits::has(word, bits::EXST),
            hdrb: bits::has(word, bits::HDRB),
            sync: bits::has(word, bits::SYNC),
            rca: bits::get(word, bits::RCA_SHIFT, bits::RCA_MASK) as u8,
            vs: bits::get(word, bits::VS_SHIFT, bits::VS_MASK) as u8,
            dv: bits::has(word, bits::DV),
            sv: bits::has(word, bits::SV),
            swo: bits::get(word, bits::SWO_SHIFT, bits::SWO_MASK) as u8,
            fd: bits::has(word, bits::FD),
            ev: bits::has(word, bits::EV),
            ebo: bits::get(word, bits::EBO_SHIFT, bits::EBO_MASK) as u8,
            rtsa: bits::has(word, bits::RTSA),
            rtsp: bits::has(word, bits::RTSP),
            txc: bits::get(word, bits::TXC_SHIFT, bits::TXC_MASK) as u8,
        }
    }

    /// Encode to a 32-bit word with parity set.
    ///
    /// The host never sends footers; this is what a MAC-PHY (or a test
    /// double standing in for one) puts on the wire.
    pub fn to_word(&self) -> u32 {
        let flag = |set: bool, bit: u32| if set { bit } else { 0 };
        let word = flag(self.exst, bits::EXST)
            | flag(self.hdrb, bits::HDRB)
            | flag(self.sync, bits::SYNC)
            | bits::put(self.rca as u32, bits::RCA_SHIFT, bits::RCA_MASK)
            | bits::put(self.vs as u32, bits::VS_SHIFT, bits::VS_MASK)
            | flag(self.dv, bits::DV)
            | flag(self.sv, bits::SV)
            | bits::put(self.swo as u32, bits::SWO_SHIFT, bits::SWO_MASK)
            | flag(self.fd, bits::FD)
            | flag(self.ev, bits::EV)
            | bits::put(self.ebo as u32, bits::EBO_SHIFT, bits::EBO_MASK)
            | flag(self.rtsa, bits::RTSA)
            | flag(self.rtsp, bits::RTSP)
            | bits::put(self.txc as u32, bits::TXC_SHIFT, bits::TXC_MASK);
        with_parity(word)
    }

    /// Byte offset at which a new frame starts in this chunk.
    #[inline]
    pub fn start_byte_offset(&self) -> usize {
        self.swo as usize * 4
    }

    /// Byte offset of the last byte of the ending frame in this chunk.
    #[inline]
    pub fn end_byte_offset(&self) -> usize {
        self.ebo as usize
    }
}

/// Header of a single-register control transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtrlHeader {
    /// Write (true) or read (false).
    pub write: bool,
    /// Address increment disabled.
    pub aid: bool,
    /// Memory map selector (0-15).
    pub mms: u8,
    /// Register offset within the memory map.
    pub addr: u16,
    /// Number of registers minus one.
    pub len: u8,
}

impl CtrlHeader {
    /// Header for a single-register access.
    pub fn single(write: bool, mms: u8, addr: u16) -> Self {
        Self {
            write,
            aid: true,
            mms,
            addr,
            len: 0,
        }
    }

    /// Encode to a 32-bit word with DNC clear and parity set.
    pub fn to_word(&self) -> u32 {
        let mut word = 0;
        if self.write {
            word |= bits::WNR;
        }
        if self.aid {
            word |= bits::AID;
        }
        word |= bits::put(self.mms as u32, bits::MMS_SHIFT, bits::MMS_MASK);
        word |= bits::put(self.addr as u32, bits::ADDR_SHIFT, bits::ADDR_MASK);
        word |= bits::put(self.len as u32, bits::LEN_SHIFT, bits::LEN_MASK);
        with_parity(word)
    }

    /// Decode from a 32-bit word. Parity is not checked.
    pub fn from_word(word: u32) -> Self {
        Self {
            write: bits::has(word, bits::WNR),
            aid: bits::has(word, bits::AID),
            mms: bits::get(word, bits::MMS_SHIFT, bits::MMS_MASK) as u8,
            addr: bits::get(word, bits::ADDR_SHIFT, bits::ADDR_MASK) as u16,
            len: bits::get(word, bits::LEN_SHIFT, bits::LEN_MASK) as u8,
        }
    }
}

/// Check whether a received or sent word belongs to a data chunk.
#[inline]
pub fn is_data_word(word: u32) -> bool {
    bits::has(word, bits::DNC)
}
