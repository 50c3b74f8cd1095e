//! Four-byte magic numbers identifying the codec's stream types.
//!
//! Every produced stream opens with one of these values in network order.
//! The signature magics double as the strong-hash selector: the hash family
//! is fixed when the signature is generated and travels with the stream.

/// Magic for a delta stream, the four-byte literal `rs\x026`.
pub const DELTA_MAGIC: u32 = 0x72730236;

/// Magic for a signature stream with MD4 strong sums, `rs\x016`.
///
/// Compatible with pre-1.0 producers but deprecated: MD4 lets an attacker
/// who controls part of the basis craft colliding blocks.
pub const MD4_SIG_MAGIC: u32 = 0x72730136;

/// Magic for a signature stream with BLAKE2b strong sums, `rs\x017`.
pub const BLAKE2_SIG_MAGIC: u32 = 0x72730137;

/// Any stream magic the codec understands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Magic {
    /// A delta stream.
    Delta,
    /// A signature stream carrying MD4 strong sums.
    Md4Signature,
    /// A signature stream carrying BLAKE2b strong sums.
    Blake2Signature,
}

impl Magic {
    /// Returns the wire value of the magic.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        match self {
            Self::Delta => DELTA_MAGIC,
            Self::Md4Signature => MD4_SIG_MAGIC,
            Self::Blake2Signature => BLAKE2_SIG_MAGIC,
        }
    }

    /// Parses a wire value; `None` for anything the codec does not know.
    #[must_use]
    pub const fn from_wire(value: u32) -> Option<Self> {
        match value {
            DELTA_MAGIC => Some(Self::Delta),
            MD4_SIG_MAGIC => Some(Self::Md4Signature),
            BLAKE2_SIG_MAGIC => Some(Self::Blake2Signature),
            _ => None,
        }
    }

    /// Reports whether this magic opens a signature stream.
    #[must_use]
    pub const fn is_signature(self) -> bool {
        matches!(self, Self::Md4Signature | Self::Blake2Signature)
    }
}

/// The subset of magics that open a signature stream.
///
/// The default is BLAKE2b; MD4 exists only to read and produce streams for
/// peers that predate it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SignatureMagic {
    /// MD4 strong sums (deprecated).
    Md4,
    /// BLAKE2b strong sums.
    #[default]
    Blake2,
}

impl SignatureMagic {
    /// Returns the wire value of the magic.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        match self {
            Self::Md4 => MD4_SIG_MAGIC,
            Self::Blake2 => BLAKE2_SIG_MAGIC,
        }
    }

    /// Parses a wire value; `None` when it is not a signature magic.
    #[must_use]
    pub const fn from_wire(value: u32) -> Option<Self> {
        match value {
            MD4_SIG_MAGIC => Some(Self::Md4),
            BLAKE2_SIG_MAGIC => Some(Self::Blake2),
            _ => None,
        }
    }
}

impl From<SignatureMagic> for Magic {
    fn from(magic: SignatureMagic) -> Self {
        match magic {
            SignatureMagic::Md4 => Self::Md4Signature,
            SignatureMagic::Blake2 => Self::Blake2Signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_spell_rs() {
        assert_eq!(&DELTA_MAGIC.to_be_bytes(), b"rs\x026");
        assert_eq!(&MD4_SIG_MAGIC.to_be_bytes(), b"rs\x016");
        assert_eq!(&BLAKE2_SIG_MAGIC.to_be_bytes(), b"rs\x017");
    }

    #[test]
    fn round_trip_through_wire_values() {
        for magic in [Magic::Delta, Magic::Md4Signature, Magic::Blake2Signature] {
            assert_eq!(Magic::from_wire(magic.to_wire()), Some(magic));
        }
        for magic in [SignatureMagic::Md4, SignatureMagic::Blake2] {
            assert_eq!(SignatureMagic::from_wire(magic.to_wire()), Some(magic));
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert_eq!(Magic::from_wire(0), None);
        assert_eq!(SignatureMagic::from_wire(DELTA_MAGIC), None);
    }

    #[test]
    fn default_signature_magic_is_blake2() {
        assert_eq!(SignatureMagic::default(), SignatureMagic::Blake2);
    }

    #[test]
    fn signature_predicate() {
        assert!(!Magic::Delta.is_signature());
        assert!(Magic::Md4Signature.is_signature());
        assert!(Magic::Blake2Signature.is_signature());
    }
}
