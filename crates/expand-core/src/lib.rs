pub mod index;
pub mod merge;
pub mod settings;
pub mod store;
