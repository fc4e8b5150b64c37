pub mod export;
pub mod image;
pub mod preferences;
pub mod session;
pub mod transformation;
