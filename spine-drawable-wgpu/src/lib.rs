//! `wgpu` backend for `spine-drawable`: uploads atlas pages, records drawable geometry for a
//! frame and replays it in a render pass.

#![forbid(unsafe_code)]

mod renderer;
mod texture;

pub use renderer::{FrameRecorder, GpuVertex, RecordedDraw, SpineRenderer};
pub use texture::{
    GpuTexture, WgpuTextureLoader, create_sampler_for_atlas_page, create_texture_bind_group,
    decode_page_image,
};

#[cfg(test)]
mod renderer_tests;

#[cfg(test)]
mod texture_tests;
