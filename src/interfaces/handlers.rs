pub mod downloads;
pub mod home;
pub mod studio;
pub mod system;
