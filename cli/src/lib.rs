pub mod handlers;
pub mod segments;
