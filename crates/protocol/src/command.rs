//! The delta command language.
//!
//! A delta stream is a sequence of single-byte opcodes, each optionally
//! followed by fixed-width big-endian operands and, for literals, the
//! payload bytes themselves:
//!
//! | Opcode | Meaning |
//! |---|---|
//! | `0x00` | END of the delta |
//! | `0x01..=0x40` | LITERAL; the opcode itself is the payload length |
//! | `0x41..=0x44` | LITERAL with a 1/2/4/8-byte length operand |
//! | `0x45..=0x54` | COPY with offset × length operands, widths {1,2,4,8} each |
//! | `0x55..=0xff` | reserved |
//!
//! A COPY opcode is `0x45 + 4·w(offset) + w(len)` where `w` maps widths
//! 1/2/4/8 to 0/1/2/3; the offset width is the major axis. Encoders always
//! pick the smallest width that fits, which keeps the encoding canonical.

use thiserror::Error;

use crate::netint::{get_uint, min_width, put_uint};

/// END of the delta stream.
pub const OP_END: u8 = 0x00;
/// First short-literal opcode (payload length 1).
pub const OP_LITERAL_1: u8 = 0x01;
/// Last short-literal opcode (payload length 64).
pub const OP_LITERAL_64: u8 = 0x40;
/// First long-literal opcode (one-byte length operand).
pub const OP_LITERAL_N1: u8 = 0x41;
/// Last long-literal opcode (eight-byte length operand).
pub const OP_LITERAL_N8: u8 = 0x44;
/// First copy opcode (one-byte offset, one-byte length).
pub const OP_COPY_N1_N1: u8 = 0x45;
/// Last copy opcode (eight-byte offset, eight-byte length).
pub const OP_COPY_N8_N8: u8 = 0x54;

/// Longest possible command header: opcode plus two eight-byte operands.
pub const MAX_COMMAND_LEN: usize = 17;

/// One decoded delta command.
///
/// `Literal` describes only the payload length; the payload bytes follow the
/// header on the wire and are streamed separately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Insert the next `len` bytes of the delta stream verbatim.
    Literal {
        /// Number of payload bytes that follow the header.
        len: u64,
    },
    /// Copy `len` bytes starting at `offset` in the basis.
    Copy {
        /// Byte position in the basis where copying begins.
        offset: u64,
        /// Number of basis bytes to copy.
        len: u64,
    },
    /// Terminates the delta stream.
    End,
}

/// Malformed command headers.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum CommandError {
    /// The opcode is not assigned in the command table.
    #[error("reserved delta opcode {opcode:#04x}")]
    ReservedOpcode {
        /// The offending opcode byte.
        opcode: u8,
    },
    /// A long-literal or copy operand encoded a length of zero.
    #[error("zero-length {kind} command")]
    ZeroLength {
        /// Which command kind carried the zero operand.
        kind: &'static str,
    },
}

/// Width exponent: maps 1/2/4/8 to 0/1/2/3.
const fn width_index(width: usize) -> u8 {
    match width {
        1 => 0,
        2 => 1,
        4 => 2,
        _ => 3,
    }
}

impl Command {
    /// Appends the command header to `out`, returning the bytes written.
    ///
    /// Literal payload bytes are not part of the header and are appended by
    /// the caller. The encoding is canonical: operands use the smallest
    /// width that fits.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> usize {
        let before = out.len();
        match *self {
            Self::End => out.push(OP_END),
            Self::Literal { len } => {
                debug_assert!(len > 0, "literal commands must carry payload");
                if len <= 64 {
                    out.push(len as u8);
                } else {
                    let width = min_width(len);
                    out.push(OP_LITERAL_N1 + width_index(width));
                    put_uint(out, len, width);
                }
            }
            Self::Copy { offset, len } => {
                debug_assert!(len > 0, "copy commands must cover at least one byte");
                let offset_width = min_width(offset);
                let len_width = min_width(len);
                out.push(OP_COPY_N1_N1 + 4 * width_index(offset_width) + width_index(len_width));
                put_uint(out, offset, offset_width);
                put_uint(out, len, len_width);
            }
        }
        out.len() - before
    }

    /// Number of operand bytes following `opcode`, excluding literal payload.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ReservedOpcode`] for unassigned opcodes.
    pub fn operand_len(opcode: u8) -> Result<usize, CommandError> {
        match opcode {
            OP_END..=OP_LITERAL_64 => Ok(0),
            OP_LITERAL_N1..=OP_LITERAL_N8 => Ok(1 << (opcode - OP_LITERAL_N1)),
            OP_COPY_N1_N1..=OP_COPY_N8_N8 => {
                let index = opcode - OP_COPY_N1_N1;
                Ok((1 << (index >> 2)) + (1 << (index & 3)))
            }
            _ => Err(CommandError::ReservedOpcode { opcode }),
        }
    }

    /// Decodes one command header from the front of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` does not yet hold the whole header; the
    /// caller coalesces more input and retries. On success the command and
    /// the number of header bytes consumed are returned.
    ///
    /// # Errors
    ///
    /// [`CommandError::ReservedOpcode`] for unassigned opcodes and
    /// [`CommandError::ZeroLength`] for operand-encoded lengths of zero.
    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, CommandError> {
        let Some(&opcode) = buf.first() else {
            return Ok(None);
        };
        let operands = Self::operand_len(opcode)?;
        let Some(body) = buf.get(1..1 + operands) else {
            return Ok(None);
        };

        let command = match opcode {
            OP_END => Self::End,
            OP_LITERAL_1..=OP_LITERAL_64 => Self::Literal {
                len: u64::from(opcode),
            },
            OP_LITERAL_N1..=OP_LITERAL_N8 => {
                let len = get_uint(body, operands);
                if len == 0 {
                    return Err(CommandError::ZeroLength { kind: "literal" });
                }
                Self::Literal { len }
            }
            _ => {
                let index = opcode - OP_COPY_N1_N1;
                let offset_width = 1 << (index >> 2);
                let len_width = 1 << (index & 3);
                let offset = get_uint(body, offset_width);
                let len = get_uint(&body[offset_width..], len_width);
                if len == 0 {
                    return Err(CommandError::ZeroLength { kind: "copy" });
                }
                Self::Copy { offset, len }
            }
        };

        Ok(Some((command, 1 + operands)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(command: &Command) -> Vec<u8> {
        let mut out = Vec::new();
        command.encode_into(&mut out);
        out
    }

    #[test]
    fn end_is_a_single_zero_byte() {
        assert_eq!(encoded(&Command::End), [0x00]);
    }

    #[test]
    fn short_literals_pack_length_into_opcode() {
        assert_eq!(encoded(&Command::Literal { len: 1 }), [0x01]);
        assert_eq!(encoded(&Command::Literal { len: 5 }), [0x05]);
        assert_eq!(encoded(&Command::Literal { len: 64 }), [0x40]);
    }

    #[test]
    fn long_literals_pick_smallest_width() {
        assert_eq!(encoded(&Command::Literal { len: 65 }), [0x41, 65]);
        assert_eq!(encoded(&Command::Literal { len: 0x100 }), [0x42, 0x01, 0x00]);
        assert_eq!(
            encoded(&Command::Literal { len: 0x1_0000 }),
            [0x43, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(
            encoded(&Command::Literal {
                len: 0x1_0000_0000
            }),
            [0x44, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn copy_opcode_encodes_both_widths() {
        assert_eq!(
            encoded(&Command::Copy { offset: 2, len: 4 }),
            [0x45, 0x02, 0x04]
        );
        // Two-byte offset, one-byte length.
        assert_eq!(
            encoded(&Command::Copy {
                offset: 0x0400,
                len: 8
            }),
            [0x49, 0x04, 0x00, 0x08]
        );
        // One-byte offset, two-byte length.
        assert_eq!(
            encoded(&Command::Copy {
                offset: 8,
                len: 0x0400
            }),
            [0x46, 0x08, 0x04, 0x00]
        );
        // Widest form.
        assert_eq!(
            encoded(&Command::Copy {
                offset: u64::MAX,
                len: 0x1_0000_0000
            })
            .len(),
            MAX_COMMAND_LEN
        );
        assert_eq!(
            encoded(&Command::Copy {
                offset: u64::MAX,
                len: 0x1_0000_0000
            })[0],
            0x54
        );
    }

    #[test]
    fn zero_offset_still_uses_one_byte() {
        assert_eq!(
            encoded(&Command::Copy { offset: 0, len: 8 }),
            [0x45, 0x00, 0x08]
        );
    }

    #[test]
    fn decode_rejects_reserved_opcodes() {
        for opcode in 0x55u8..=0xff {
            assert_eq!(
                Command::decode(&[opcode]),
                Err(CommandError::ReservedOpcode { opcode })
            );
        }
    }

    #[test]
    fn decode_rejects_zero_length_operands() {
        assert_eq!(
            Command::decode(&[0x41, 0x00]),
            Err(CommandError::ZeroLength { kind: "literal" })
        );
        assert_eq!(
            Command::decode(&[0x45, 0x07, 0x00]),
            Err(CommandError::ZeroLength { kind: "copy" })
        );
    }

    #[test]
    fn decode_reports_underflow_as_incomplete() {
        assert_eq!(Command::decode(&[]), Ok(None));
        assert_eq!(Command::decode(&[0x42, 0x01]), Ok(None));
        assert_eq!(Command::decode(&[0x54, 0, 0, 0]), Ok(None));
    }

    #[test]
    fn operand_len_covers_the_table() {
        assert_eq!(Command::operand_len(0x00), Ok(0));
        assert_eq!(Command::operand_len(0x3f), Ok(0));
        assert_eq!(Command::operand_len(0x41), Ok(1));
        assert_eq!(Command::operand_len(0x44), Ok(8));
        assert_eq!(Command::operand_len(0x45), Ok(2));
        assert_eq!(Command::operand_len(0x48), Ok(9));
        assert_eq!(Command::operand_len(0x54), Ok(16));
        assert!(Command::operand_len(0x55).is_err());
    }
}
