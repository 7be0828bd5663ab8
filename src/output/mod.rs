// Output generation module

pub mod markdown;
pub mod templates;

pub use markdown::*;
pub use templates::*;
