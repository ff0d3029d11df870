//! Analyzer control words
//!
//! Everything an analyzer sends back to the distributor is a single
//! big-endian `u32`. Bit 31 discriminates the two kinds: set for cumulative
//! ACKs, clear for weight updates (the word is then the bit pattern of a
//! float32, which the clear sign bit constrains to be non-negative).

/// Size of a control word on the wire
pub const CONTROL_WORD_LEN: usize = 4;

/// MSB flag marking a control word as a cumulative ACK
pub const ACK_FLAG: u32 = 1 << 31;

/// Mask for the 31-bit sequence space
pub const SEQ_MASK: u32 = 0x7FFF_FFFF;

/// A decoded analyzer control word
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlWord {
    /// Cumulative acknowledgement: every sequence number up to and including
    /// this one has been consumed
    Ack(u32),

    /// New relative traffic weight for this analyzer
    Weight(f32),
}

impl ControlWord {
    /// Decode a control word from its wire bytes
    ///
    /// Never fails: every 4-byte pattern is either an ACK (MSB set) or a
    /// weight (MSB clear). Whether a weight is acceptable is the session's
    /// decision, not the codec's.
    #[inline]
    pub fn decode(raw: [u8; CONTROL_WORD_LEN]) -> Self {
        let word = u32::from_be_bytes(raw);
        if word & ACK_FLAG != 0 {
            Self::Ack(word & SEQ_MASK)
        } else {
            Self::Weight(f32::from_bits(word))
        }
    }

    /// Encode to wire bytes
    ///
    /// ACK sequence numbers are masked into the 31-bit space; weights are
    /// emitted as their raw bit pattern.
    #[inline]
    pub fn encode(self) -> [u8; CONTROL_WORD_LEN] {
        let word = match self {
            Self::Ack(seq) => ACK_FLAG | (seq & SEQ_MASK),
            Self::Weight(w) => w.to_bits(),
        };
        word.to_be_bytes()
    }

    /// True if this word is a weight with a usable value
    ///
    /// A clear MSB still admits +Inf and NaN bit patterns; sessions reject
    /// those rather than feed them to the router.
    pub fn is_valid_weight(&self) -> bool {
        matches!(self, Self::Weight(w) if w.is_finite())
    }
}
