// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are grouped by domain; each adds methods to `CaptureWidget`.

pub mod camera;
pub mod capture;
pub mod host;
