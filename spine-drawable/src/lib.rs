//! Drawable component for Spine skeletons.
//!
//! Owns one skeleton instance from the `spine2d` runtime, advances it on an update tick and
//! tessellates its pose into 16-bit indexed geometry plus per-material draw commands on a draw
//! tick. Host engines plug in through [`AssetSource`], [`TextureLoader`] and [`DrawSink`]
//! (see `spine-drawable-wgpu`).

#![forbid(unsafe_code)]

mod assets;
mod bounds;
mod config;
mod drawable;
mod error;
mod event;
mod mesh;
mod texture;

pub use assets::*;
pub use bounds::*;
pub use config::*;
pub use drawable::*;
pub use error::*;
pub use event::{EventKind, SpineEvent};
pub use mesh::*;
pub use texture::*;

pub use spine2d;

#[cfg(test)]
mod test_fixtures;


#[cfg(test)]
mod config_tests;
