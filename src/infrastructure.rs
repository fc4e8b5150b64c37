pub mod archive;
pub mod delivery;
pub mod utils;
