//! codec/mod.rs
//! Invisible-character channel: bytes <-> zero-width code points.
//!
//! - `alphabet`: the k code points a codec writes (k in {2, 4, 8, 16})
//! - `zero_width`: fixed-width base-k digit groups, one per byte
//! - `framed`: sentinel-framed codeword appended to host text
//!
//! Decoding is total. It never panics and never errors; it answers "absent".

pub mod alphabet;
pub mod zero_width;
pub mod framed;

pub use alphabet::*;
pub use zero_width::*;
pub use framed::*;
