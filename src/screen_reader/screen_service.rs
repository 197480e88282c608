//! Screen capture service

use anyhow::{Context, Result};
use image::RgbaImage;
use screenshots::Screen;
use serde::{Deserialize, Serialize};

/// Rectangle in screen-absolute pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }

    /// A region is usable for capture only when both sides are non-zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Absolute center point
    pub fn center(&self) -> (i32, i32) {
        (
            self.left + (self.width / 2) as i32,
            self.top + (self.height / 2) as i32,
        )
    }

    /// Whether a point relative to this region's origin lies inside it
    pub fn contains_relative(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}x{})", self.left, self.top, self.width, self.height)
    }
}

/// What to grab from the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureArea {
    /// The whole primary screen. Pixel (0, 0) of the result sits at [`ScreenCapture::origin`].
    FullScreen,
    Region(Region),
}

/// Capture primitive used by every detector.
///
/// Implementations return RGBA pixels; captures are synchronous and may block.
pub trait ScreenCapture: Send {
    fn capture(&self, area: CaptureArea) -> Result<RgbaImage>;

    /// Size of the primary screen in pixels
    fn screen_size(&self) -> Result<(u32, u32)>;

    /// Desktop position of the primary screen's top-left corner
    fn origin(&self) -> Result<(i32, i32)> {
        Ok((0, 0))
    }
}

/// Service for capturing screenshots of the primary display
#[derive(Debug, Default)]
pub struct ScreenService;

impl ScreenService {
    /// Create a new screen service
    pub fn new() -> Self {
        Self
    }

    fn primary_screen() -> Result<Screen> {
        let screens = Screen::all().context("Failed to get screens")?;

        // Get primary screen (first one)
        screens
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No screens found"))
    }
}

impl ScreenCapture for ScreenService {
    fn capture(&self, area: CaptureArea) -> Result<RgbaImage> {
        let screen = Self::primary_screen()?;

        let image = match area {
            CaptureArea::Region(r) => {
                if !r.is_valid() {
                    anyhow::bail!("Refusing to capture empty region {}", r);
                }
                // The backend takes coordinates relative to the screen
                let info = &screen.display_info;
                screen
                    .capture_area(r.left - info.x, r.top - info.y, r.width, r.height)
                    .with_context(|| format!("Failed to capture area {}", r))?
            }
            CaptureArea::FullScreen => screen.capture().context("Failed to capture screen")?,
        };

        // Rebuild through raw bytes so the image crate version of the capture backend does not leak
        RgbaImage::from_raw(image.width(), image.height(), image.to_vec())
            .context("Failed to create image from raw data")
    }

    fn screen_size(&self) -> Result<(u32, u32)> {
        let screen = Self::primary_screen()?;
        Ok((screen.display_info.width, screen.display_info.height))
    }

    fn origin(&self) -> Result<(i32, i32)> {
        let screen = Self::primary_screen()?;
        Ok((screen.display_info.x, screen.display_info.y))
    }
}
