//! Core type definitions

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;
