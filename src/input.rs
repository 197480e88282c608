//! Input simulation module for mouse and keyboard control

use std::time::Duration;

#[cfg(windows)]
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
#[cfg(windows)]
use std::thread;

/// Number of intermediate steps used for a timed pointer move
#[cfg(windows)]
const MOVE_STEPS: u32 = 10;

/// Mouse buttons the bot uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
}

/// Simulated pointer and key events, in absolute screen pixels.
///
/// Methods do not fail: injection problems are logged by the implementation.
pub trait InputController: Send {
    /// Move the pointer, spreading the motion over `duration`
    fn move_to(&mut self, x: i32, y: i32, duration: Duration);
    fn press(&mut self, button: MouseButton);
    fn release(&mut self, button: MouseButton);
    /// Left click at the current pointer position
    fn click(&mut self);
    /// Press and release a named key
    fn press_key(&mut self, key: &str);
}

/// Keeps a mouse button asserted and guarantees it is released when dropped
pub struct HoldGuard<'a> {
    input: &'a mut dyn InputController,
    button: MouseButton,
    held: bool,
}

impl<'a> HoldGuard<'a> {
    pub fn new(input: &'a mut dyn InputController, button: MouseButton) -> Self {
        Self { input, button, held: false }
    }

    pub fn hold(&mut self) {
        self.input.press(self.button);
        self.held = true;
    }

    /// Release unconditionally, even if this guard never pressed
    pub fn release(&mut self) {
        self.input.release(self.button);
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn click(&mut self) {
        self.input.click();
    }
}

impl Drop for HoldGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            tracing::debug!("[INPUT] Releasing {:?} held past scope end", self.button);
            self.input.release(self.button);
        }
    }
}

/// enigo-backed input on Windows, logging stub elsewhere
pub struct EnigoInput {
    #[cfg(windows)]
    enigo: Enigo,
}

impl EnigoInput {
    #[cfg(windows)]
    pub fn new() -> anyhow::Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow::anyhow!("Failed to create Enigo: {:?}", e))?;
        Ok(Self { enigo })
    }

    #[cfg(not(windows))]
    pub fn new() -> anyhow::Result<Self> {
        tracing::warn!("Input simulation not implemented on this platform");
        Ok(Self {})
    }
}

#[cfg(windows)]
fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
    }
}

#[cfg(windows)]
impl InputController for EnigoInput {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) {
        if !duration.is_zero() {
            if let Ok((sx, sy)) = self.enigo.location() {
                let step_delay = duration / MOVE_STEPS;
                for step in 1..MOVE_STEPS {
                    let t = step as f64 / MOVE_STEPS as f64;
                    let ix = sx + ((x - sx) as f64 * t).round() as i32;
                    let iy = sy + ((y - sy) as f64 * t).round() as i32;
                    let _ = self.enigo.move_mouse(ix, iy, Coordinate::Abs);
                    thread::sleep(step_delay);
                }
            }
        }
        if let Err(e) = self.enigo.move_mouse(x, y, Coordinate::Abs) {
            tracing::warn!("Failed to move mouse to ({}, {}): {:?}", x, y, e);
        }
    }

    fn press(&mut self, button: MouseButton) {
        if let Err(e) = self.enigo.button(to_enigo_button(button), Direction::Press) {
            tracing::warn!("Failed to press mouse button: {:?}", e);
        }
    }

    fn release(&mut self, button: MouseButton) {
        if let Err(e) = self.enigo.button(to_enigo_button(button), Direction::Release) {
            tracing::warn!("Failed to release mouse button: {:?}", e);
        }
    }

    fn click(&mut self) {
        if let Err(e) = self.enigo.button(Button::Left, Direction::Click) {
            tracing::warn!("Failed to click mouse: {:?}", e);
        }
    }

    fn press_key(&mut self, key: &str) {
        match string_to_enigo_key(key) {
            Some(enigo_key) => {
                if let Err(e) = self.enigo.key(enigo_key, Direction::Click) {
                    tracing::warn!("Failed to press key '{}': {:?}", key, e);
                }
            }
            None => tracing::warn!("Unknown key name '{}'", key),
        }
    }
}

#[cfg(not(windows))]
impl InputController for EnigoInput {
    fn move_to(&mut self, _x: i32, _y: i32, _duration: Duration) {
        tracing::warn!("move_to not implemented on this platform");
    }

    fn press(&mut self, _button: MouseButton) {
        tracing::warn!("mouse press not implemented on this platform");
    }

    fn release(&mut self, _button: MouseButton) {
        tracing::warn!("mouse release not implemented on this platform");
    }

    fn click(&mut self) {
        tracing::warn!("click not implemented on this platform");
    }

    fn press_key(&mut self, _key: &str) {
        tracing::warn!("press_key not implemented on this platform");
    }
}

/// Convert string key name to enigo Key
#[cfg(windows)]
fn string_to_enigo_key(key: &str) -> Option<Key> {
    // Single characters go through lowercase to avoid keyboard layout mapping issues
    if key.chars().count() == 1 {
        let c = key.chars().next()?.to_ascii_lowercase();
        return Some(Key::Unicode(c));
    }

    match key.to_uppercase().as_str() {
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "ENTER" | "RETURN" => Some(Key::Return),
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "BACKSPACE" => Some(Key::Backspace),
        "UP" => Some(Key::UpArrow),
        "DOWN" => Some(Key::DownArrow),
        "LEFT" => Some(Key::LeftArrow),
        "RIGHT" => Some(Key::RightArrow),
        "F1" => Some(Key::F1),
        "F2" => Some(Key::F2),
        "F3" => Some(Key::F3),
        "F4" => Some(Key::F4),
        _ => None,
    }
}
