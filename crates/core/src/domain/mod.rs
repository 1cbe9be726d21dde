pub mod recommendation;
pub mod request;
pub mod signal;
