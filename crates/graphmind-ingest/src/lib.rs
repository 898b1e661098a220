pub mod loader;
pub mod splitter;

pub use loader::DocumentLoader;
pub use splitter::RecursiveCharacterSplitter;
