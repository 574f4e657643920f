pub mod assets;
pub mod home;
pub mod posts;
pub mod profile;
pub mod search;
pub mod uploads;
