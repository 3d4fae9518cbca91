use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::config::CompareConfig;
use crate::models::comparison::ComparisonRecord;
use crate::services::face::{self, FaceDetector, FaceError};
use crate::services::similarity;

/// Compares two face images with a pluggable detector.
pub struct FaceComparator<D> {
    detector: D,
}

impl<D: FaceDetector> FaceComparator<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Similarity score in roughly [0, 1] for the faces in `left` and `right`.
    ///
    /// `left` is processed first, so a missing face there is reported even if
    /// `right` has none either.
    pub fn compare(&self, left: &Path, right: &Path) -> Result<f64, CompareError> {
        let left_face = face::extract_face(&self.detector, left)?;
        let right_face = face::extract_face(&self.detector, right)?;
        Ok(similarity::face_similarity(&left_face, &right_face))
    }
}

/// Append a record to the comparisons CSV, writing the header only when the
/// file does not exist yet.
pub fn append_record(csv_path: &Path, record: &ComparisonRecord) -> Result<(), CompareError> {
    let file_exists = csv_path.exists();
    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

/// Fail with `FileNotFound` unless both configured images exist.
pub fn ensure_inputs(config: &CompareConfig) -> Result<(), CompareError> {
    for path in [&config.default_person_face_image, &config.infinite_person_face_image] {
        let path = Path::new(path);
        if !path.exists() {
            return Err(CompareError::FileNotFound(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Compare the configured image pair and log the result to the comparisons CSV.
pub fn run_comparison<D: FaceDetector>(
    config: &CompareConfig,
    comparator: &FaceComparator<D>,
) -> Result<ComparisonRecord, CompareError> {
    ensure_inputs(config)?;
    let left = Path::new(&config.default_person_face_image);
    let right = Path::new(&config.infinite_person_face_image);

    tracing::info!(
        default = %left.display(),
        infinite = %right.display(),
        "Comparing faces"
    );

    let score = comparator.compare(left, right)?;
    tracing::info!(
        similarity = score,
        "Face similarity: {:.4} ({:.2}%)",
        score,
        score * 100.0
    );

    let record = ComparisonRecord::new(
        config.default_person_face_image.as_str(),
        config.infinite_person_face_image.as_str(),
        score,
    );
    let csv_path = Path::new(&config.comparisons_csv);
    append_record(csv_path, &record)?;
    tracing::info!(path = %csv_path.display(), "Results saved");

    Ok(record)
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("Image not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Error comparing faces: {0}")]
    Comparison(#[from] FaceError),

    #[error("Failed to write comparisons CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
