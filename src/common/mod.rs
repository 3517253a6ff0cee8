pub mod response;
pub mod session;
pub mod upload;
