//! Image processing helpers: normalized template correlation and debug rendering

use anyhow::{Context, Result};
use image::{GrayImage, RgbImage, RgbaImage};
use opencv::{
    core::{min_max_loc, no_array, Mat, MatTraitConst, Point, Rect, Scalar, CV_8UC1, CV_8UC4},
    imgproc,
    prelude::*,
};

/// Outline colors, in the RGBA channel order the frames are kept in
const COLOR_FOUND: (f64, f64, f64) = (0.0, 255.0, 0.0);
const COLOR_MISSED: (f64, f64, f64) = (255.0, 0.0, 0.0);
const COLOR_WINDOW: (f64, f64, f64) = (0.0, 0.0, 255.0);

/// Half size of the square drawn at the region center when the marker is lost
const MISS_MARK_HALF: i32 = 10;

/// Best correlation peak of a template inside a searched buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// TM_CCOEFF_NORMED score, roughly in [0, 1] for useful matches
    pub score: f64,
    /// Top-left corner of the peak, relative to the searched buffer
    pub location: (i32, i32),
    /// Template size (w, h)
    pub size: (u32, u32),
}

/// Convert image::GrayImage to OpenCV Mat
pub fn gray_image_to_mat(img: &GrayImage) -> opencv::Result<Mat> {
    let (width, height) = (img.width() as i32, img.height() as i32);
    let data = img.as_raw();

    // 1 byte per pixel for 8-bit grayscale
    let step = width as usize;
    let mat = unsafe {
        Mat::new_rows_cols_with_data_unsafe(
            height,
            width,
            CV_8UC1,
            data.as_ptr() as *mut std::ffi::c_void,
            step,
        )?
    };

    // The borrowed buffer belongs to the GrayImage; hand back an owned copy
    Ok(mat.clone())
}

/// Convert an RGBA frame to a 4-channel Mat without reordering channels
fn rgba_image_to_mat(img: &RgbaImage) -> opencv::Result<Mat> {
    let (width, height) = (img.width() as i32, img.height() as i32);
    let data = img.as_raw();

    let step = width as usize * 4;
    let mat = unsafe {
        Mat::new_rows_cols_with_data_unsafe(
            height,
            width,
            CV_8UC4,
            data.as_ptr() as *mut std::ffi::c_void,
            step,
        )?
    };

    Ok(mat.clone())
}

fn mat_to_rgb_image(mat: &Mat) -> Result<RgbImage> {
    let width = mat.cols() as u32;
    let height = mat.rows() as u32;
    let bytes = mat.data_bytes().context("Debug frame is not continuous")?;
    let rgba = RgbaImage::from_raw(width, height, bytes.to_vec())
        .context("Debug frame has unexpected size")?;
    Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
}

/// Run TM_CCOEFF_NORMED and return the global maximum
pub fn best_match(haystack: &GrayImage, template: &GrayImage) -> Result<MatchResult> {
    if template.width() > haystack.width() || template.height() > haystack.height() {
        anyhow::bail!(
            "Template {}x{} larger than search buffer {}x{}",
            template.width(),
            template.height(),
            haystack.width(),
            haystack.height()
        );
    }

    let img_mat = gray_image_to_mat(haystack).context("Failed to wrap search buffer")?;
    let template_mat = gray_image_to_mat(template).context("Failed to wrap template")?;

    let mut result = Mat::default();
    imgproc::match_template(
        &img_mat,
        &template_mat,
        &mut result,
        imgproc::TM_CCOEFF_NORMED,
        &no_array(),
    )
    .context("Template matching failed")?;

    let mut max_val = 0.0;
    let mut max_loc = Point::new(0, 0);
    min_max_loc(
        &result,
        None,
        Some(&mut max_val),
        None,
        Some(&mut max_loc),
        &no_array(),
    )
    .context("Failed to locate correlation peak")?;

    // Flat inputs give an undefined correlation
    let score = if max_val.is_finite() { max_val } else { 0.0 };

    Ok(MatchResult {
        score,
        location: (max_loc.x, max_loc.y),
        size: (template.width(), template.height()),
    })
}

/// What the marker visualization should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerOverlay {
    /// Accepted match; rectangle relative to the frame
    Found { left: i32, top: i32, width: u32, height: u32 },
    /// Rejected match with its raw score
    Missed { score: f64 },
}

fn scalar((r, g, b): (f64, f64, f64)) -> Scalar {
    Scalar::new(r, g, b, 255.0)
}

/// Draw the detection outcome on a full capture-region frame
pub fn render_marker_debug(
    frame: &RgbaImage,
    overlay: MarkerOverlay,
    search_window: Option<Rect>,
) -> Result<RgbImage> {
    let mut canvas = rgba_image_to_mat(frame).context("Failed to wrap debug frame")?;

    match overlay {
        MarkerOverlay::Found { left, top, width, height } => {
            imgproc::rectangle(
                &mut canvas,
                Rect::new(left, top, width as i32, height as i32),
                scalar(COLOR_FOUND),
                2,
                imgproc::LINE_8,
                0,
            )?;
        }
        MarkerOverlay::Missed { score } => {
            let cx = frame.width() as i32 / 2;
            let cy = frame.height() as i32 / 2;
            imgproc::rectangle(
                &mut canvas,
                Rect::new(
                    cx - MISS_MARK_HALF,
                    cy - MISS_MARK_HALF,
                    MISS_MARK_HALF * 2,
                    MISS_MARK_HALF * 2,
                ),
                scalar(COLOR_MISSED),
                2,
                imgproc::LINE_8,
                0,
            )?;
            imgproc::put_text(
                &mut canvas,
                &format!("Match FAIL ({:.2})", score),
                Point::new(10, 20),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.45,
                scalar(COLOR_MISSED),
                1,
                imgproc::LINE_8,
                false,
            )?;
        }
    }

    if let Some(window) = search_window {
        imgproc::rectangle(
            &mut canvas,
            window,
            scalar(COLOR_WINDOW),
            1,
            imgproc::LINE_8,
            0,
        )?;
    }

    mat_to_rgb_image(&canvas)
}

/// Frame shown when a capture could not be processed at all
pub fn blank_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::new(width.max(1), height.max(1))
}
