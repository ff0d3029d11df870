//! Ferry wire protocol
//!
//! Both ports of the distributor speak length-prefixed frames; the analyzer
//! port additionally carries a 4-byte control-word stream in the reverse
//! direction.
//!
//! # Frame format
//!
//! ```text
//! [4 bytes: total length (big-endian, includes this prefix)]
//! [1 byte : severity (0 = highest priority)]
//! [total length - 5 bytes: payload]
//! ```
//!
//! Frames are forwarded byte-for-byte: the bytes an emitter sends are exactly
//! the bytes its chosen analyzer receives. The distributor never inspects the
//! payload.
//!
//! # Control words (analyzer → distributor)
//!
//! One big-endian `u32` per logical message, discriminated by the MSB:
//!
//! - MSB = 1: cumulative ACK, low 31 bits are the last consumed sequence
//!   number.
//! - MSB = 0: the 32 bits are the IEEE-754 bit pattern of a float32 weight
//!   (necessarily non-negative, since the sign bit is clear).

mod control;
mod error;
mod frame;

pub use control::{ControlWord, ACK_FLAG, CONTROL_WORD_LEN, SEQ_MASK};
pub use error::FrameError;
pub use frame::{FrameDecoder, Message, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN, LENGTH_PREFIX_LEN};
