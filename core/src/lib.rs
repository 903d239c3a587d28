//! watermark-core
//!
//! Invisible, password-sealed watermarks for office documents, PDF and plain text.
//! Pure Rust. No FFI.
//!
//! Layers, leaves first:
//! - `codec`: bytes <-> zero-width code points
//! - `crypto` + `compression`: the sealed envelope
//! - `obfuscate`: marker interleaving over the wire string
//! - `location` + `container`: named slots inside each document kind
//! - `engine`: redundant write, cross-validated read
//! - `batch`: many files on a bounded worker pool

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod codec;
pub mod compression;
pub mod crypto;
pub mod obfuscate;
pub mod record;
pub mod telemetry;

pub mod location;
pub mod container;

pub mod engine;
pub mod batch;
pub mod report;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::batch::{run_batch, BatchJob, BatchProfile, BatchResult};
    pub use crate::codec::{Alphabet, FramedChannel, ZeroWidthCodec};
    pub use crate::container::{Container, ContainerKind};
    pub use crate::crypto::{EncryptedEnvelope, Envelope, EnvelopeConfig};
    pub use crate::engine::{EmbedReport, EngineConfig, Verified, WatermarkEngine};
    pub use crate::location::{Carrier, EmbeddingLocation};
    pub use crate::obfuscate::Obfuscator;
    pub use crate::record::WatermarkRecord;
    pub use crate::report::VerifyResponse;
    pub use crate::types::{AdapterError, WatermarkError};
}
