//! Pixel-source collaborator interface.
//!
//! Screen capture is a thin vendor wrapper owned by the hosting service;
//! this crate only depends on the interface below. A capture either
//! produces an image or "no data"; capture failures are expected (windows
//! minimized mid-call, capture session lost) and are reported to callers as
//! data, never as panics.

use crate::types::{Bounds, MonitorId};
use image::DynamicImage;
use tracing::{debug, trace};

/// Captures rectangular screen regions to raw images.
///
/// Methods take `&mut self`: OS capture sessions are generally usable from
/// one caller at a time, so exclusive access is part of the contract. Hosts
/// running multiple workers provide one source per worker or serialize
/// access externally; this crate keeps no state between calls, so that is
/// the only coordination required.
pub trait PixelSource {
    /// Capture an arbitrary screen rectangle. `None` means no data.
    fn capture_region(
        &mut self,
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    ) -> Option<DynamicImage>;

    /// Capture an entire monitor. `None` means no data.
    fn capture_monitor(&mut self, monitor: MonitorId) -> Option<DynamicImage>;
}

/// Capture the screen rectangle a window occupies.
///
/// Rejects degenerate rectangles (a window mid-minimize can report zero or
/// negative extent) before touching the source.
pub fn grab_window(source: &mut dyn PixelSource, bounds: &Bounds) -> Option<DynamicImage> {
    let width = bounds.width();
    let height = bounds.height();

    if width <= 0 || height <= 0 {
        debug!(
            "Skipping capture of degenerate rectangle {}x{}",
            width, height
        );
        return None;
    }

    trace!(
        "Capturing {}x{} at ({}, {})",
        width,
        height,
        bounds.left,
        bounds.top
    );

    source.capture_region(bounds.left, bounds.top, width as u32, height as u32)
}
