//! Business logic shared by route handlers and the CLI.

pub mod cart;
