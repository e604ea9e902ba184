pub mod media;
pub mod patch;
