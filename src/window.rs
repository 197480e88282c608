//! Best-effort game window focusing and Win32 message pumping

#[cfg(windows)]
use windows::core::PCWSTR;
#[cfg(windows)]
use windows::Win32::Foundation::HWND;
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, FindWindowW, PeekMessageW, SetForegroundWindow, ShowWindow,
    TranslateMessage, MSG, PM_REMOVE, SW_RESTORE,
};

/// Capability to bring the target application to the foreground.
///
/// Success is advisory: callers behave the same whether or not focusing worked.
pub trait WindowFocus: Send {
    fn focus(&self) -> bool;
}

/// Focuses nothing; for platforms without window management and for tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFocus;

impl WindowFocus for NoFocus {
    fn focus(&self) -> bool {
        false
    }
}

/// Focuses a top-level window by exact title
#[derive(Debug, Clone)]
pub struct GameWindow {
    title: String,
}

impl GameWindow {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    #[cfg(windows)]
    fn find(&self) -> Option<HWND> {
        let title_wide: Vec<u16> = self.title.encode_utf16().chain(std::iter::once(0)).collect();

        unsafe {
            let hwnd = FindWindowW(PCWSTR::null(), PCWSTR(title_wide.as_ptr())).ok()?;
            if hwnd.0 as usize == 0 {
                None
            } else {
                Some(hwnd)
            }
        }
    }
}

#[cfg(windows)]
impl WindowFocus for GameWindow {
    fn focus(&self) -> bool {
        let Some(hwnd) = self.find() else {
            tracing::warn!("Window '{}' not found.", self.title);
            return false;
        };

        unsafe {
            let _ = ShowWindow(hwnd, SW_RESTORE);
            SetForegroundWindow(hwnd).as_bool()
        }
    }
}

#[cfg(not(windows))]
impl WindowFocus for GameWindow {
    fn focus(&self) -> bool {
        tracing::debug!("Window focusing not implemented on this platform");
        false
    }
}

/// Drain pending thread messages so global hotkey events get delivered
#[cfg(windows)]
pub fn pump_messages() {
    let mut msg = MSG::default();
    unsafe {
        while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(not(windows))]
pub fn pump_messages() {}
