pub mod content;
pub mod upload;
