// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for still capture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ JPEG data URL    │
//! │ (YUYV / RGB) │     │  - draw to RGB    │     │ (host payload)   │
//! │              │     │  - JPEG q=85      │     │                  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! - [`photo`]: frame drawing and JPEG/data-URL encoding

pub mod photo;
