//! Messages posted by the worker for the presentation layer

use std::sync::mpsc::{self, Receiver, Sender};

use image::RgbImage;

/// One message from the fishing worker
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Log(String),
    /// Full capture-region visualization of the latest marker detection
    DebugImage(RgbImage),
}

/// Sending half of the worker's event queue.
///
/// Posting never blocks and never fails: if nobody is listening the event is dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<Sender<SessionEvent>>,
}

impl EventSink {
    /// New sink plus the receiver the presentation layer drains on its own schedule
    pub fn channel() -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only mirrors logs to tracing
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.post(SessionEvent::Log(message));
    }

    pub fn debug_image(&self, image: RgbImage) {
        self.post(SessionEvent::DebugImage(image));
    }

    fn post(&self, event: SessionEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
