pub mod comparison;
pub mod face;
pub mod http;
pub mod image_data;
pub mod infinite_you;
pub mod polling;
pub mod similarity;
pub mod text_to_image;
