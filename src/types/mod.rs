pub mod context;
pub mod notice;
