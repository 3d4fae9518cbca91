use serde::Serialize;

/// One row of the comparisons log.
///
/// Field names double as the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    #[serde(rename = "DEFAULT_PERSON_FACE_IMAGE")]
    pub default_image: String,

    #[serde(rename = "INFINITE_PERSON_FACE_IMAGE")]
    pub infinite_image: String,

    /// Similarity formatted to six decimal places.
    #[serde(rename = "Face_ID_Similarity")]
    pub similarity: String,
}

impl ComparisonRecord {
    pub fn new(default_image: impl Into<String>, infinite_image: impl Into<String>, similarity: f64) -> Self {
        Self {
            default_image: default_image.into(),
            infinite_image: infinite_image.into(),
            similarity: format!("{:.6}", similarity),
        }
    }
}
