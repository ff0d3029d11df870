//! Checksummed test payloads
//!
//! Payload format: `emitter_id:timestamp_nanos:counter:` followed by cyclic
//! `A-Z` padding, with a 64-character lowercase SHA-256 hex digest of
//! everything before it appended at the end. Analyzers can re-hash the body
//! and compare against the trailing digest to detect corruption anywhere in
//! the pipeline.
//!
//! The distributor itself never looks at any of this - payloads are opaque to
//! the core.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the trailing hex checksum
pub const CHECKSUM_LEN: usize = 64;

/// Build a payload of roughly `target_size` bytes
///
/// The header and checksum are always present, so payloads never shrink
/// below `header + 64` bytes regardless of the target.
pub fn build_payload(emitter_id: &str, counter: u64, target_size: usize) -> Vec<u8> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let header = format!("{emitter_id}:{timestamp}:{counter:08}:");

    let padding_len = target_size.saturating_sub(header.len() + CHECKSUM_LEN);
    let mut payload = Vec::with_capacity(header.len() + padding_len + CHECKSUM_LEN);
    payload.extend_from_slice(header.as_bytes());
    payload.extend((0..padding_len).map(|i| b'A' + (i % 26) as u8));

    let digest = Sha256::digest(&payload);
    payload.extend_from_slice(hex::encode(digest).as_bytes());
    payload
}

/// Verify the trailing checksum of a payload
pub fn validate_payload(payload: &[u8]) -> bool {
    if payload.len() < CHECKSUM_LEN {
        return false;
    }
    let (body, checksum) = payload.split_at(payload.len() - CHECKSUM_LEN);
    let digest = Sha256::digest(body);
    hex::encode(digest).as_bytes().eq_ignore_ascii_case(checksum)
}

/// Draw a log-normal payload size, clamped to `[min, max]`
///
/// `mean` parameterises the distribution itself (the underlying normal gets
/// `μ = ln(mean) − σ²/2`), so the sampled sizes average out near `mean`.
pub fn sample_payload_size<R: Rng>(
    rng: &mut R,
    mean: f64,
    stddev: f64,
    min: usize,
    max: usize,
) -> usize {
    let mu = mean.ln() - 0.5 * stddev * stddev;

    // Box-Muller from two uniforms
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    let normal = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();

    let size = (mu + stddev * normal).exp();
    size.round().clamp(min as f64, max as f64) as usize
}

/// How the emitter picks a severity for each message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityMode {
    /// Everything at severity 1
    Single,
    /// Uniform over severities 0–15
    Random,
    /// 50% P0, 30% P1, 15% P2, 5% spread over P3–P7
    Weighted,
    /// Cycle through severities 0–7
    Cyclic,
}

impl PriorityMode {
    /// Pick the severity for the `counter`-th message
    pub fn next<R: Rng>(self, counter: u64, rng: &mut R) -> u8 {
        match self {
            Self::Single => 1,
            Self::Random => rng.gen_range(0..16),
            Self::Weighted => {
                let r: f32 = rng.gen();
                if r < 0.5 {
                    0
                } else if r < 0.8 {
                    1
                } else if r < 0.95 {
                    2
                } else {
                    rng.gen_range(3..8)
                }
            }
            Self::Cyclic => (counter % 8) as u8,
        }
    }
}

impl FromStr for PriorityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "random" => Ok(Self::Random),
            "weighted" => Ok(Self::Weighted),
            "cyclic" => Ok(Self::Cyclic),
            other => Err(format!(
                "unknown priority mode '{other}' (expected single, random, weighted, or cyclic)"
            )),
        }
    }
}
