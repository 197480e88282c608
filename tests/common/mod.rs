//! Scripted screen and recording input shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use auto_angler::events::{EventSink, SessionEvent};
use auto_angler::input::{InputController, MouseButton};
use auto_angler::screen_reader::{CaptureArea, Region, ScreenCapture, Template};

pub const SCREEN_W: u32 = 640;
pub const SCREEN_H: u32 = 480;

/// Deterministic per-pixel noise in 10..110, so no pixel ever counts as lit
pub fn noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x
        .wrapping_mul(374_761_393)
        .wrapping_add(y.wrapping_mul(668_265_263))
        .wrapping_add(seed.wrapping_mul(2_246_822_519));
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    (h % 100) as u8 + 10
}

pub fn marker_image(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| Luma([noise(x, y, 7)]))
}

pub fn bar_image() -> GrayImage {
    GrayImage::from_fn(80, 30, |x, y| Luma([noise(x, y, 23)]))
}

pub fn marker_template(size: u32) -> Template {
    Template::new("bobber_template.png", marker_image(size))
}

pub fn bar_template() -> Template {
    Template::new("bar_template.png", bar_image())
}

/// What is visible on one simulated desktop frame; positions are screen-absolute
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub marker: Option<(u32, u32)>,
    pub marker_size: u32,
    pub bar: Option<(u32, u32)>,
    /// Lit pixel on screen, used to drive the minigame strip
    pub light: Option<(u32, u32)>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            marker_size: 20,
            ..Default::default()
        }
    }

    pub fn marker_at(mut self, x: u32, y: u32) -> Self {
        self.marker = Some((x, y));
        self
    }

    pub fn marker_size(mut self, size: u32) -> Self {
        self.marker_size = size;
        self
    }

    pub fn bar_at(mut self, x: u32, y: u32) -> Self {
        self.bar = Some((x, y));
        self
    }

    pub fn light_at(mut self, x: u32, y: u32) -> Self {
        self.light = Some((x, y));
        self
    }

    pub fn render(&self) -> RgbaImage {
        let mut frame = RgbaImage::from_fn(SCREEN_W, SCREEN_H, |x, y| {
            let v = noise(x, y, 1);
            Rgba([v, v, v, 255])
        });

        let mut paste = |img: &GrayImage, (ox, oy): (u32, u32)| {
            for (x, y, p) in img.enumerate_pixels() {
                let v = p.0[0];
                frame.put_pixel(ox + x, oy + y, Rgba([v, v, v, 255]));
            }
        };
        if let Some(at) = self.marker {
            paste(&marker_image(self.marker_size), at);
        }
        if let Some(at) = self.bar {
            paste(&bar_image(), at);
        }
        if let Some((x, y)) = self.light {
            frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
        frame
    }
}

type FailWhen = Box<dyn Fn(usize, &CaptureArea) -> bool + Send>;

/// Plays back a list of frames.
///
/// Every capture of the watched area moves to the next frame; the last frame repeats.
pub struct FakeScreen {
    frames: Vec<RgbaImage>,
    watched: CaptureArea,
    cursor: AtomicUsize,
    calls: AtomicUsize,
    fail_when: FailWhen,
    size_fails: bool,
    origin: (i32, i32),
    pub captures: Arc<Mutex<Vec<CaptureArea>>>,
}

impl FakeScreen {
    pub fn new(scenes: &[Scene], watched: Region) -> Self {
        Self {
            frames: scenes.iter().map(Scene::render).collect(),
            watched: CaptureArea::Region(watched),
            cursor: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            fail_when: Box::new(|_, _| false),
            size_fails: false,
            origin: (0, 0),
            captures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail captures for which `f(previous_call_count, area)` is true
    pub fn failing_when(mut self, f: impl Fn(usize, &CaptureArea) -> bool + Send + 'static) -> Self {
        self.fail_when = Box::new(f);
        self
    }

    pub fn without_screen_size(mut self) -> Self {
        self.size_fails = true;
        self
    }

    /// Place the primary screen at a desktop offset, as on a multi-monitor layout
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn capture_log(&self) -> Arc<Mutex<Vec<CaptureArea>>> {
        self.captures.clone()
    }
}

impl ScreenCapture for FakeScreen {
    fn capture(&self, area: CaptureArea) -> Result<RgbaImage> {
        self.captures.lock().unwrap().push(area);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if (self.fail_when)(call, &area) {
            bail!("simulated capture failure");
        }

        let index = self.cursor.load(Ordering::SeqCst).min(self.frames.len() - 1);
        if area == self.watched {
            self.cursor.fetch_add(1, Ordering::SeqCst);
        }
        let frame = &self.frames[index];

        Ok(match area {
            CaptureArea::FullScreen => frame.clone(),
            CaptureArea::Region(r) => RgbaImage::from_fn(r.width, r.height, |x, y| {
                let sx = r.left - self.origin.0 + x as i32;
                let sy = r.top - self.origin.1 + y as i32;
                if sx >= 0 && sy >= 0 && (sx as u32) < frame.width() && (sy as u32) < frame.height() {
                    *frame.get_pixel(sx as u32, sy as u32)
                } else {
                    Rgba([0, 0, 0, 255])
                }
            }),
        })
    }

    fn screen_size(&self) -> Result<(u32, u32)> {
        if self.size_fails {
            bail!("display unavailable");
        }
        Ok((SCREEN_W, SCREEN_H))
    }

    fn origin(&self) -> Result<(i32, i32)> {
        Ok(self.origin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Move(i32, i32),
    Press(MouseButton),
    Release(MouseButton),
    Click,
    Key(String),
}

/// Records every injected event; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingInput {
    pub events: Arc<Mutex<Vec<InputEvent>>>,
}

impl RecordingInput {
    pub fn snapshot(&self) -> Vec<InputEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl InputController for RecordingInput {
    fn move_to(&mut self, x: i32, y: i32, _duration: Duration) {
        self.events.lock().unwrap().push(InputEvent::Move(x, y));
    }

    fn press(&mut self, button: MouseButton) {
        self.events.lock().unwrap().push(InputEvent::Press(button));
    }

    fn release(&mut self, button: MouseButton) {
        self.events.lock().unwrap().push(InputEvent::Release(button));
    }

    fn click(&mut self) {
        self.events.lock().unwrap().push(InputEvent::Click);
    }

    fn press_key(&mut self, key: &str) {
        self.events.lock().unwrap().push(InputEvent::Key(key.to_string()));
    }
}

/// Drain only the log lines from an event receiver
pub fn drain_logs(rx: &std::sync::mpsc::Receiver<SessionEvent>) -> Vec<String> {
    rx.try_iter()
        .filter_map(|e| match e {
            SessionEvent::Log(line) => Some(line),
            SessionEvent::DebugImage(_) => None,
        })
        .collect()
}

pub fn quiet_sink() -> EventSink {
    EventSink::disconnected()
}
