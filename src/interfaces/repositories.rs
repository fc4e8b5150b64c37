pub mod downloads;
pub mod rendition;
pub mod session_store;
