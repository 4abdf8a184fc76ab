pub mod entries;
pub mod reports;
pub mod settings;
