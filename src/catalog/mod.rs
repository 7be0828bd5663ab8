// Catalog assembly: walks the specification and builds the package tree

pub mod diagram;
pub mod package;
pub mod project;
pub mod returns;
pub mod selector;
pub mod sequence;

#[cfg(test)]
pub(crate) mod testing;

pub use diagram::*;
pub use package::*;
pub use project::*;
pub use returns::*;
pub use selector::*;
pub use sequence::*;
