pub mod credential;
pub mod discovery;
pub mod files;
