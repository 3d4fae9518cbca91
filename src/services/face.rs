use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::GrayImage;

/// Side length of the normalized face crop.
pub const FACE_SIZE: u32 = 128;

/// Axis-aligned face rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Clip a possibly out-of-bounds rectangle to an image of `img_w` × `img_h`.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    pub fn clamped(x: i64, y: i64, width: i64, height: i64, img_w: u32, img_h: u32) -> Option<Self> {
        let x0 = x.clamp(0, img_w as i64);
        let y0 = y.clamp(0, img_h as i64);
        let x1 = (x + width).clamp(0, img_w as i64);
        let y1 = (y + height).clamp(0, img_h as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Face detection backend.
pub trait FaceDetector {
    /// Detect faces in a grayscale image, in the backend's native order.
    fn detect(&self, gray: &GrayImage) -> Vec<FaceRegion>;
}

/// Parameters for the cascade detector.
#[derive(Debug, Clone)]
pub struct CascadeParams {
    /// Size ratio between successive pyramid levels.
    pub scale_factor: f32,
    pub min_face_size: u32,
    /// Minimum cascade score for a window to count as a face.
    pub score_thresh: f64,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_face_size: 20,
            score_thresh: 2.0,
        }
    }
}

/// Frontal-face cascade detector backed by the `rustface` crate (SeetaFace engine).
pub struct RustfaceDetector {
    model: rustface::Model,
    params: CascadeParams,
}

impl RustfaceDetector {
    /// Load the cascade model from disk.
    pub fn from_file(path: &Path, params: CascadeParams) -> Result<Self, FaceError> {
        let file = std::fs::File::open(path).map_err(|e| FaceError::Model {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model = rustface::read_model(std::io::BufReader::new(file)).map_err(|e| {
            FaceError::Model {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(path = %path.display(), "Loaded face detection model");
        Ok(Self { model, params })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &GrayImage) -> Vec<FaceRegion> {
        let (width, height) = gray.dimensions();
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.params.min_face_size);
        detector.set_score_thresh(self.params.score_thresh);
        detector.set_pyramid_scale_factor(1.0 / self.params.scale_factor);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                FaceRegion::clamped(
                    bbox.x() as i64,
                    bbox.y() as i64,
                    bbox.width() as i64,
                    bbox.height() as i64,
                    width,
                    height,
                )
            })
            .collect()
    }
}

/// Load an image, detect a face, and return its grayscale crop resized to
/// [`FACE_SIZE`] × [`FACE_SIZE`].
///
/// When several faces are found the first one reported by the detector is used.
pub fn extract_face<D: FaceDetector + ?Sized>(detector: &D, path: &Path) -> Result<GrayImage, FaceError> {
    let image = image::open(path).map_err(|source| FaceError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let gray = image.to_luma8();

    let faces = detector.detect(&gray);
    let region = match faces.as_slice() {
        [] => {
            return Err(FaceError::NoFaceDetected {
                path: path.to_path_buf(),
            })
        }
        [only] => *only,
        [first, ..] => {
            tracing::warn!(
                path = %path.display(),
                faces = faces.len(),
                "Multiple faces detected, using first face"
            );
            *first
        }
    };

    Ok(normalize_face(&gray, region))
}

/// Crop `region` out of `gray` and resize it to the comparison size.
pub fn normalize_face(gray: &GrayImage, region: FaceRegion) -> GrayImage {
    let crop = imageops::crop_imm(gray, region.x, region.y, region.width, region.height).to_image();
    imageops::resize(&crop, FACE_SIZE, FACE_SIZE, FilterType::Triangle)
}

#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    #[error("Could not load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("No face detected in image: {}", path.display())]
    NoFaceDetected { path: PathBuf },

    #[error("Could not load face model {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
}
