//! hgpkit core library
//!
//! This crate provides the renderable model representation that the decoders
//! in `hgpkit-parsers` produce. Nothing here knows about the container format:
//! a [`Model`] is a list of draw chunks over indexed vertex buffers, plus the
//! materials and textures those chunks reference.

pub mod types;

pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::types::*;
}
