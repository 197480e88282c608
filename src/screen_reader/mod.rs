//! Screen reader module for capturing and analyzing screen content

pub mod image_service;
pub mod screen_service;
pub mod templates;

pub use image_service::{best_match, MatchResult};
pub use screen_service::{CaptureArea, Region, ScreenCapture, ScreenService};
pub use templates::{load_template, Template, TemplateStore};
