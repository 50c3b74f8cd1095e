//! Rolling checksum used for weak block matching.
//!
//! The checksum maintains two 16-bit components: `s1` sums the window bytes
//! (each offset by [`CHAR_OFFSET`]) and `s2` sums the running prefixes of
//! `s1`. Shifting the window by one byte is an O(1) update, which is what
//! makes scanning every offset of a stream affordable.
//!
//! # Example
//!
//! ```rust
//! use checksums::RollingChecksum;
//!
//! let mut rolling = RollingChecksum::new();
//! rolling.update(b"abcd");
//!
//! // Slide the window: remove 'a', add 'e'.
//! rolling.rotate(b'a', b'e').unwrap();
//!
//! let mut fresh = RollingChecksum::new();
//! fresh.update(b"bcde");
//! assert_eq!(rolling.value(), fresh.value());
//! ```

mod checksum;
mod error;

pub use checksum::{CHAR_OFFSET, RollingChecksum};
pub use error::RollingError;
