//! telemetry/counters.rs
//! Mutable counters used during a single embed or extract call.
//!
//! Summary: Collects location outcomes and byte counts.
//! Converted into an immutable TelemetrySnapshot when the call ends.
use std::ops::AddAssign;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub locations_attempted: u64,
    pub locations_written: u64,
    pub locations_failed: u64,
    pub locations_present: u64,
    pub locations_absent: u64,
    pub bytes_plaintext: u64,
    pub bytes_compressed: u64,
    pub bytes_ciphertext: u64,
    pub bytes_payload: u64,
}

impl TelemetryCounters {
    /// Record one location write attempt.
    pub fn add_write(&mut self, ok: bool) {
        self.locations_attempted += 1;
        if ok {
            self.locations_written += 1;
        } else {
            self.locations_failed += 1;
        }
    }

    /// Record one location read.
    /// - `present`: the slot held a value
    /// - a failed read counts as neither present nor absent
    pub fn add_read(&mut self, outcome: Option<bool>) {
        self.locations_attempted += 1;
        match outcome {
            Some(true) => self.locations_present += 1,
            Some(false) => self.locations_absent += 1,
            None => self.locations_failed += 1,
        }
    }

    /// Record the sizes produced by one seal or consumed by one open.
    ///
    /// - `pt_len`: serialized record length
    /// - `comp_len`: compression frame length
    /// - `ct_len`: ciphertext length (nonce + AEAD output)
    pub fn add_envelope(&mut self, pt_len: usize, comp_len: usize, ct_len: usize) {
        self.bytes_plaintext += pt_len as u64;
        self.bytes_compressed += comp_len as u64;
        self.bytes_ciphertext += ct_len as u64;
    }

    /// Record the obfuscated payload length (chars) written to each slot.
    pub fn add_payload(&mut self, payload_chars: usize) {
        self.bytes_payload += payload_chars as u64;
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.locations_attempted += other.locations_attempted;
        self.locations_written += other.locations_written;
        self.locations_failed += other.locations_failed;
        self.locations_present += other.locations_present;
        self.locations_absent += other.locations_absent;

        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_compressed += other.bytes_compressed;
        self.bytes_ciphertext += other.bytes_ciphertext;
        self.bytes_payload += other.bytes_payload;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
