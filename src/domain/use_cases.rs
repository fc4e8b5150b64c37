pub mod export;
pub mod studio;
pub mod transformation;
