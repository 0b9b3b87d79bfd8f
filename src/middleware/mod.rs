//! Request middleware: Application Key gate and navigation Request Gate.

pub mod app_key;
pub mod gate;
