pub mod mime;
pub mod range;
pub mod ssrf;
pub mod upload;
