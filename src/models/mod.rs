pub mod comparison;
pub mod inference;
pub mod job;
