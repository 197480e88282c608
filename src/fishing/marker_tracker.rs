//! Bobber tracking inside the casting region.
//!
//! The first lookup of a cast scans the whole region. Once the bobber has been seen,
//! later lookups only capture a small window around the last known center, clamped to
//! the region, and translate the match back to region coordinates. The debug frame
//! always shows the whole region so viewers keep a stable frame of reference.

use std::sync::Arc;

use anyhow::Result;
use image::{GrayImage, RgbaImage};
use opencv::core::Rect;

use crate::events::EventSink;
use crate::screen_reader::image_service::{blank_frame, render_marker_debug, MarkerOverlay};
use crate::screen_reader::{best_match, CaptureArea, Region, ScreenCapture, Template};

/// Minimum correlation for a bobber match
pub const MATCH_THRESHOLD: f64 = 0.4;
/// Half size of the narrowed search window
pub const SEARCH_RADIUS: u32 = 30;
/// Narrowed windows smaller than this fall back to a full scan
pub const MIN_WINDOW_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub match_threshold: f64,
    pub search_radius: u32,
    pub min_window: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            match_threshold: MATCH_THRESHOLD,
            search_radius: SEARCH_RADIUS,
            min_window: MIN_WINDOW_SIZE,
        }
    }
}

/// Sub-rectangle of the capture region, relative to the region's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    /// False when the window is the whole region
    pub narrowed: bool,
}

impl SearchWindow {
    pub fn full(region: &Region) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            width: region.width,
            height: region.height,
            narrowed: false,
        }
    }

    /// Screen-absolute rectangle of this window
    pub fn absolute(&self, region: &Region) -> Region {
        Region::new(
            region.left + self.offset_x as i32,
            region.top + self.offset_y as i32,
            self.width,
            self.height,
        )
    }

    fn as_rect(&self) -> Rect {
        Rect::new(
            self.offset_x as i32,
            self.offset_y as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

/// Window of `radius` around `last_center`, clamped to the region.
///
/// Falls back to the full region when there is no center or the clamped window is
/// narrower than `min_width` or shorter than `min_height`.
pub fn search_window(
    region: &Region,
    last_center: Option<(i32, i32)>,
    radius: u32,
    min_width: u32,
    min_height: u32,
) -> SearchWindow {
    let Some((cx, cy)) = last_center else {
        return SearchWindow::full(region);
    };

    let r = radius as i64;
    let x0 = (cx as i64 - r).max(0);
    let y0 = (cy as i64 - r).max(0);
    let x1 = (cx as i64 + r).min(region.width as i64);
    let y1 = (cy as i64 + r).min(region.height as i64);

    let width = x1 - x0;
    let height = y1 - y0;
    if width < min_width as i64 || height < min_height as i64 {
        return SearchWindow::full(region);
    }

    SearchWindow {
        offset_x: x0 as u32,
        offset_y: y0 as u32,
        width: width as u32,
        height: height as u32,
        narrowed: true,
    }
}

/// An accepted bobber sighting
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDetection {
    /// Grayscale crop of the matched area
    pub image: GrayImage,
    pub size: (u32, u32),
    /// Center relative to the capture region's origin
    pub center: (i32, i32),
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    pub last: Option<MarkerDetection>,
    /// Misses since the last accepted match; informational only
    pub consecutive_fail_count: u32,
}

pub struct MarkerTracker {
    template: Arc<Template>,
    config: TrackerConfig,
    state: TrackingState,
}

impl MarkerTracker {
    pub fn new(template: Arc<Template>, config: TrackerConfig) -> Self {
        Self {
            template,
            config,
            state: TrackingState::default(),
        }
    }

    /// Forget everything about the previous cast
    pub fn reset(&mut self) {
        self.state = TrackingState::default();
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn last_center(&self) -> Option<(i32, i32)> {
        self.state.last.as_ref().map(|d| d.center)
    }

    /// Look for the bobber; capture or matching errors count as "not found"
    pub fn locate(
        &mut self,
        screen: &dyn ScreenCapture,
        region: Region,
        events: &EventSink,
    ) -> Option<MarkerDetection> {
        match self.try_locate(screen, region, events) {
            Ok(found) => found,
            Err(e) => {
                events.log(format!("Error during capture and template matching: {:#}", e));
                events.debug_image(blank_frame(region.width, region.height));
                None
            }
        }
    }

    fn try_locate(
        &mut self,
        screen: &dyn ScreenCapture,
        region: Region,
        events: &EventSink,
    ) -> Result<Option<MarkerDetection>> {
        let (t_w, t_h) = (self.template.width(), self.template.height());
        let window = search_window(
            &region,
            self.last_center(),
            self.config.search_radius,
            self.config.min_window.max(t_w),
            self.config.min_window.max(t_h),
        );

        let capture = screen.capture(CaptureArea::Region(window.absolute(&region)))?;
        let gray = image::imageops::grayscale(&capture);
        let found = best_match(&gray, &self.template.image)?;

        let accepted = found.score >= self.config.match_threshold;
        let (loc_x, loc_y) = found.location;
        let left = loc_x + window.offset_x as i32;
        let top = loc_y + window.offset_y as i32;

        let overlay = if accepted {
            MarkerOverlay::Found { left, top, width: t_w, height: t_h }
        } else {
            MarkerOverlay::Missed { score: found.score }
        };

        // The visualization always covers the whole region
        let full_frame: RgbaImage = if window.narrowed {
            screen.capture(CaptureArea::Region(region))?
        } else {
            capture
        };
        let outline = window.narrowed.then(|| window.as_rect());
        match render_marker_debug(&full_frame, overlay, outline) {
            Ok(frame) => events.debug_image(frame),
            Err(e) => tracing::warn!("[TRACKER] Failed to render debug frame: {:#}", e),
        }

        if !accepted {
            self.state.consecutive_fail_count += 1;
            tracing::trace!(
                "[TRACKER] Bobber NOT FOUND - score={:.3} < threshold={:.2} (misses: {})",
                found.score,
                self.config.match_threshold,
                self.state.consecutive_fail_count
            );
            return Ok(None);
        }

        let crop = image::imageops::crop_imm(&gray, loc_x as u32, loc_y as u32, t_w, t_h).to_image();
        let detection = MarkerDetection {
            image: crop,
            size: (t_w, t_h),
            center: (left + (t_w / 2) as i32, top + (t_h / 2) as i32),
            score: found.score,
        };

        tracing::trace!(
            "[TRACKER] Bobber at {:?} score={:.3} narrowed={}",
            detection.center,
            found.score,
            window.narrowed
        );

        self.state.last = Some(detection.clone());
        self.state.consecutive_fail_count = 0;
        Ok(Some(detection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_center_scans_full_region() {
        let region = Region::new(100, 100, 50, 50);
        let window = search_window(&region, None, 30, 10, 10);
        assert_eq!(window, SearchWindow::full(&region));
        assert!(!window.narrowed);
    }

    #[test]
    fn test_window_is_centered_when_room_allows() {
        let region = Region::new(0, 0, 200, 200);
        let window = search_window(&region, Some((100, 80)), 30, 10, 10);
        assert_eq!((window.offset_x, window.offset_y), (70, 50));
        assert_eq!((window.width, window.height), (60, 60));
        assert!(window.narrowed);
        assert_eq!(window.absolute(&region), Region::new(70, 50, 60, 60));
    }

    #[test]
    fn test_window_is_clamped_at_edges() {
        let region = Region::new(300, 400, 100, 80);
        let window = search_window(&region, Some((5, 75)), 30, 10, 10);
        assert_eq!((window.offset_x, window.offset_y), (0, 45));
        assert_eq!((window.width, window.height), (35, 35));
        assert_eq!(window.absolute(&region), Region::new(300, 445, 35, 35));
    }

    #[test]
    fn test_collapsed_window_falls_back() {
        let region = Region::new(0, 0, 100, 100);
        // Center far outside the region leaves nothing after clamping
        let window = search_window(&region, Some((-50, 20)), 30, 10, 10);
        assert!(!window.narrowed);

        // Narrower than the template is also unusable
        let window = search_window(&region, Some((2, 50)), 30, 40, 10);
        assert_eq!(window, SearchWindow::full(&region));
    }

    #[test]
    fn test_window_always_inside_region() {
        let region = Region::new(10, 20, 57, 43);
        for cx in (-40..100).step_by(7) {
            for cy in (-40..90).step_by(5) {
                let w = search_window(&region, Some((cx, cy)), 30, 10, 10);
                assert!(w.offset_x + w.width <= region.width, "x overflow at {},{}", cx, cy);
                assert!(w.offset_y + w.height <= region.height, "y overflow at {},{}", cx, cy);
                assert!(w.width >= 10 && w.height >= 10);
            }
        }
    }
}
