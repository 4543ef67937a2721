// SPDX-License-Identifier: GPL-3.0-only

//! Host-side inbox filtering of real encoded captures

use capture_widget::host::inbox::{RateLimiter, average_hash, decode_data_url};
use capture_widget::host::{FrameInbox, HostValue, InboxOutcome};
use capture_widget::pipelines::photo::PhotoEncoder;
use image::{Rgb, RgbImage};
use std::time::{Duration, Instant};

/// 64x64 image, white on one half and black on the other
fn split_image(white_left: bool) -> String {
    let image = RgbImage::from_fn(64, 64, |x, _| {
        if (x < 32) == white_left {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    PhotoEncoder::new().encode(&image).unwrap().data_url
}

fn capture(data: &str, timestamp: i64) -> HostValue {
    HostValue::Capture {
        data: data.to_string(),
        timestamp,
    }
}

#[test]
fn test_hash_sees_layout() {
    let left = decode_data_url(&split_image(true)).unwrap();
    let right = decode_data_url(&split_image(false)).unwrap();

    let left_hash = average_hash(&left).unwrap();
    let right_hash = average_hash(&right).unwrap();
    // Each row reads 11110000 for the white-left image
    assert_eq!(left_hash, 0xF0F0_F0F0_F0F0_F0F0);
    assert_eq!(right_hash, !left_hash);
}

#[test]
fn test_identical_frames_are_duplicates() {
    let mut inbox = FrameInbox::default();
    let frame = split_image(true);
    let now = Instant::now();

    assert!(matches!(
        inbox.process_at(&capture(&frame, 1), now),
        InboxOutcome::Accepted(_)
    ));
    assert_eq!(
        inbox.process_at(&capture(&frame, 2), now),
        InboxOutcome::Duplicate { similarity: 1.0 }
    );
    assert_eq!(inbox.stats().accepted, 1);
    assert_eq!(inbox.stats().duplicates, 1);
}

#[test]
fn test_changed_scene_is_accepted() {
    let mut inbox = FrameInbox::default();
    let now = Instant::now();

    assert!(matches!(
        inbox.process_at(&capture(&split_image(true), 1), now),
        InboxOutcome::Accepted(_)
    ));
    assert!(matches!(
        inbox.process_at(&capture(&split_image(false), 2), now),
        InboxOutcome::Accepted(_)
    ));
}

#[test]
fn test_replayed_value_skipped() {
    let mut inbox = FrameInbox::default();
    let value = capture(&split_image(true), 42);
    let now = Instant::now();

    assert!(matches!(
        inbox.process_at(&value, now),
        InboxOutcome::Accepted(_)
    ));
    assert_eq!(inbox.process_at(&value, now), InboxOutcome::Replayed);
}

#[test]
fn test_rate_limit_window() {
    let mut inbox = FrameInbox::new(0.95, RateLimiter::new(2, Duration::from_secs(60)));
    let left = split_image(true);
    let right = split_image(false);
    let now = Instant::now();

    assert!(matches!(
        inbox.process_at(&capture(&left, 1), now),
        InboxOutcome::Accepted(_)
    ));
    assert!(matches!(
        inbox.process_at(&capture(&right, 2), now),
        InboxOutcome::Accepted(_)
    ));
    assert_eq!(
        inbox.process_at(&capture(&left, 3), now + Duration::from_secs(10)),
        InboxOutcome::RateLimited {
            wait: Duration::from_secs(50)
        }
    );

    // Window has moved on
    assert!(matches!(
        inbox.process_at(&capture(&left, 4), now + Duration::from_secs(61)),
        InboxOutcome::Accepted(_)
    ));
    assert_eq!(inbox.stats().rate_limited, 1);
}

#[test]
fn test_error_and_garbage_values() {
    let mut inbox = FrameInbox::default();

    assert_eq!(
        inbox.process(&HostValue::error("Camera is busy")),
        InboxOutcome::WidgetError("Camera is busy".to_string())
    );
    assert!(matches!(
        inbox.process(&capture("not a data url", 1)),
        InboxOutcome::Invalid(_)
    ));
    assert_eq!(inbox.stats().errors, 2);
}
