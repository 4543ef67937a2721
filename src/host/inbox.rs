// SPDX-License-Identifier: GPL-3.0-only

//! Host-side filtering of delivered frames
//!
//! A host typically forwards captures to something expensive (an image
//! analysis API, a recorder). [`FrameInbox`] sits in front of that and drops
//! frames that are not worth the cost:
//!
//! - values already seen (hosts often re-read the last delivered value)
//! - near-identical frames, by 64-bit average hash
//! - frames over the rate limit

use crate::constants::inbox::{
    DUPLICATE_THRESHOLD, HASH_SIZE, RATE_LIMIT_MAX_FRAMES, RATE_LIMIT_WINDOW,
};
use crate::host::HostValue;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::FilterType;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Decode a `data:<mime>;base64,<payload>` URL into bytes
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| "data URL has no payload separator".to_string())?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(format!("unsupported data URL header '{}'", header));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {}", e))
}

/// 64-bit average hash of an encoded image
///
/// The image is shrunk to 8x8 grayscale; each bit is set when its pixel is
/// brighter than the mean. Bit 63 is the top-left pixel.
pub fn average_hash(image_bytes: &[u8]) -> Result<u64, String> {
    let img = image::load_from_memory(image_bytes).map_err(|e| e.to_string())?;
    let thumb = img
        .resize_exact(HASH_SIZE, HASH_SIZE, FilterType::Lanczos3)
        .to_luma8();

    let pixels = thumb.as_raw();
    let mean = pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / pixels.len() as f64;

    Ok(pixels
        .iter()
        .fold(0u64, |hash, &p| (hash << 1) | u64::from(f64::from(p) > mean)))
}

/// Similarity of two hashes in `0.0..=1.0` (1.0 means identical)
pub fn hash_similarity(a: u64, b: u64) -> f64 {
    1.0 - f64::from((a ^ b).count_ones()) / 64.0
}

/// Sliding-window rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: VecDeque::with_capacity(max_calls),
        }
    }

    fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.calls.front() {
            if now.duration_since(oldest) >= self.window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether another call fits in the window at `now`
    pub fn can_proceed(&mut self, now: Instant) -> bool {
        self.expire(now);
        self.calls.len() < self.max_calls
    }

    /// Record a call made at `now`
    pub fn record(&mut self, now: Instant) {
        self.calls.push_back(now);
    }

    /// Time until the oldest call leaves the window
    pub fn wait_time(&mut self, now: Instant) -> Duration {
        self.expire(now);
        match self.calls.front() {
            Some(&oldest) if self.calls.len() >= self.max_calls => {
                (oldest + self.window).saturating_duration_since(now)
            }
            _ => Duration::ZERO,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_MAX_FRAMES, RATE_LIMIT_WINDOW)
    }
}

/// A frame that passed every filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFrame {
    /// Decoded JPEG bytes
    pub bytes: Vec<u8>,
    pub hash: u64,
    pub timestamp: i64,
}

/// What the inbox did with a delivered value
#[derive(Debug, Clone, PartialEq)]
pub enum InboxOutcome {
    Accepted(AcceptedFrame),
    /// Same timestamp as the previous value
    Replayed,
    /// Too similar to the last accepted frame
    Duplicate { similarity: f64 },
    /// Over the rate limit; retry after `wait`
    RateLimited { wait: Duration },
    /// The widget reported an error
    WidgetError(String),
    /// The payload could not be decoded
    Invalid(String),
}

/// Running totals, for status displays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxStats {
    pub accepted: u64,
    pub duplicates: u64,
    pub rate_limited: u64,
    pub errors: u64,
}

/// Filters delivered values before expensive processing
#[derive(Debug, Clone)]
pub struct FrameInbox {
    threshold: f64,
    limiter: RateLimiter,
    last_hash: Option<u64>,
    last_timestamp: Option<i64>,
    stats: InboxStats,
}

impl FrameInbox {
    pub fn new(threshold: f64, limiter: RateLimiter) -> Self {
        Self {
            threshold,
            limiter,
            last_hash: None,
            last_timestamp: None,
            stats: InboxStats::default(),
        }
    }

    pub fn stats(&self) -> InboxStats {
        self.stats
    }

    /// Process a value using the current time
    pub fn process(&mut self, value: &HostValue) -> InboxOutcome {
        self.process_at(value, Instant::now())
    }

    /// Process a value as if received at `now`
    pub fn process_at(&mut self, value: &HostValue, now: Instant) -> InboxOutcome {
        let (data, timestamp) = match value {
            HostValue::Capture { data, timestamp } => (data, *timestamp),
            HostValue::Error { message } => {
                self.stats.errors += 1;
                return InboxOutcome::WidgetError(message.clone());
            }
        };

        if self.last_timestamp == Some(timestamp) {
            return InboxOutcome::Replayed;
        }
        self.last_timestamp = Some(timestamp);

        let decoded = decode_data_url(data).and_then(|bytes| {
            let hash = average_hash(&bytes)?;
            Ok((bytes, hash))
        });
        let (bytes, hash) = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "Undecodable capture payload");
                self.stats.errors += 1;
                return InboxOutcome::Invalid(e);
            }
        };

        if let Some(last) = self.last_hash {
            let similarity = hash_similarity(hash, last);
            if similarity >= self.threshold {
                debug!(similarity, "Skipping near-duplicate frame");
                self.stats.duplicates += 1;
                return InboxOutcome::Duplicate { similarity };
            }
        }

        if !self.limiter.can_proceed(now) {
            let wait = self.limiter.wait_time(now);
            debug!(wait_secs = wait.as_secs(), "Rate limit reached");
            self.stats.rate_limited += 1;
            return InboxOutcome::RateLimited { wait };
        }

        self.limiter.record(now);
        self.last_hash = Some(hash);
        self.stats.accepted += 1;
        InboxOutcome::Accepted(AcceptedFrame {
            bytes,
            hash,
            timestamp,
        })
    }
}

impl Default for FrameInbox {
    fn default() -> Self {
        Self::new(DUPLICATE_THRESHOLD, RateLimiter::default())
    }
}
