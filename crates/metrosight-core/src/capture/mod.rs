pub mod frame;
pub mod sequence;

pub use frame::Frame;
pub use sequence::{ImageSequence, SourceError};
