//! location.rs
//! Named storage slots inside a carrier.
//!
//! A location stores one opaque string. Writing replaces whatever the slot
//! held before; reading an empty slot is `Ok(None)`, not an error.

use crate::container::ContainerKind;
use crate::types::AdapterError;

pub trait EmbeddingLocation<C: ?Sized>: Send + Sync {
    /// Stable slot name, used in reports and logs.
    fn name(&self) -> &'static str;

    fn write(&self, carrier: &mut C, payload: &str) -> Result<(), AdapterError>;

    fn read(&self, carrier: &C) -> Result<Option<String>, AdapterError>;
}

/// Anything the engine can watermark.
pub trait Carrier {
    fn kind(&self) -> ContainerKind;

    /// Fixed, ordered slot list for this carrier.
    fn locations(&self) -> Vec<Box<dyn EmbeddingLocation<Self>>>;
}

/// Attach kind and slot name to an adapter-internal failure.
pub(crate) fn at<T>(
    kind: ContainerKind,
    location: &'static str,
    result: anyhow::Result<T>,
) -> Result<T, AdapterError> {
    result.map_err(|e| AdapterError::new(kind, location, e))
}
