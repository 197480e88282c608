//! Reference template loading

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use opencv::{core::MatTraitConst, imgcodecs, prelude::*};

use crate::error::BotError;

/// A grayscale reference raster, read-only once loaded
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub image: GrayImage,
}

impl Template {
    pub fn new(name: impl Into<String>, image: GrayImage) -> Self {
        Self { name: name.into(), image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Load a template file as 8-bit grayscale
pub fn load_template(path: &Path) -> Result<Template, BotError> {
    if !path.exists() {
        return Err(BotError::TemplateMissing(path.to_path_buf()));
    }

    let unreadable = || BotError::TemplateUnreadable(path.to_path_buf());
    let path_str = path.to_str().ok_or_else(unreadable)?;

    // imread reports decode failures as an empty Mat rather than an error
    let mat = imgcodecs::imread(path_str, imgcodecs::IMREAD_GRAYSCALE).map_err(|_| unreadable())?;
    if mat.empty() {
        return Err(unreadable());
    }

    let width = mat.cols() as u32;
    let height = mat.rows() as u32;
    let bytes = mat.data_bytes().map_err(|_| unreadable())?;
    let image = GrayImage::from_raw(width, height, bytes.to_vec()).ok_or_else(unreadable)?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("template")
        .to_string();

    Ok(Template { name, image })
}

/// The two templates a fishing session needs
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    pub marker: Option<Arc<Template>>,
    pub bar: Option<Arc<Template>>,
}

impl TemplateStore {
    /// Load both templates from `folder`; a missing or broken file leaves its slot empty
    pub fn load(folder: &Path, marker_file: &str, bar_file: &str) -> Self {
        Self {
            marker: Self::load_slot(folder.join(marker_file)),
            bar: Self::load_slot(folder.join(bar_file)),
        }
    }

    fn load_slot(path: PathBuf) -> Option<Arc<Template>> {
        match load_template(&path) {
            Ok(template) => {
                tracing::info!(
                    "[INIT] Loaded template '{}' ({}x{})",
                    template.name,
                    template.width(),
                    template.height()
                );
                Some(Arc::new(template))
            }
            Err(e) => {
                tracing::warn!("[INIT] {}", e);
                None
            }
        }
    }

    pub fn from_templates(marker: Template, bar: Template) -> Self {
        Self {
            marker: Some(Arc::new(marker)),
            bar: Some(Arc::new(bar)),
        }
    }

    /// Both templates present
    pub fn is_complete(&self) -> bool {
        self.marker.is_some() && self.bar.is_some()
    }
}
