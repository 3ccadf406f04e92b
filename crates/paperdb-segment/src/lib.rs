#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod loader;
pub mod parents;
pub mod patterns;
pub mod segmenter;

pub use chunker::ParagraphChunker;
pub use parents::ParentBuilder;
pub use segmenter::{Segmenter, SegmenterConfig};
