use spine2d::{AtlasFilter, AtlasPage, AtlasWrap};
use spine_drawable::{AssetSource, Error, LoadedTexture, TextureLoader};
use std::sync::Arc;

/// An uploaded atlas page, ready to bind at group 1 of the [`crate::SpineRenderer`] pipelines.
///
/// Cloning shares the underlying bind group.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    bind_group: Arc<wgpu::BindGroup>,
    width: u32,
    height: u32,
}

impl GpuTexture {
    /// Uploads tightly packed RGBA8 (sRGB) pixels.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("spine page texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            bind_group: Arc::new(create_texture_bind_group(device, layout, &view, sampler)),
            width,
            height,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Loads atlas page images through an [`AssetSource`] and uploads them with `wgpu`.
pub struct WgpuTextureLoader<'a, A: ?Sized> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    layout: &'a wgpu::BindGroupLayout,
    assets: &'a A,
}

impl<'a, A: AssetSource + ?Sized> WgpuTextureLoader<'a, A> {
    /// `layout` is usually [`crate::SpineRenderer::texture_bind_group_layout`].
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        layout: &'a wgpu::BindGroupLayout,
        assets: &'a A,
    ) -> Self {
        Self {
            device,
            queue,
            layout,
            assets,
        }
    }
}

impl<A: AssetSource + ?Sized> TextureLoader for WgpuTextureLoader<'_, A> {
    type Texture = GpuTexture;

    fn load_texture(
        &mut self,
        path: &str,
        page: &AtlasPage,
    ) -> Result<LoadedTexture<GpuTexture>, Error> {
        let bytes = self.assets.read(path)?;
        let image = decode_page_image(path, &bytes)?;
        let (width, height) = image.dimensions();

        let sampler = create_sampler_for_atlas_page(self.device, page);
        let texture = GpuTexture::from_rgba8(
            self.device,
            self.queue,
            self.layout,
            &sampler,
            width,
            height,
            image.as_raw(),
        );
        log::debug!("uploaded {path} ({width}x{height}, pma: {})", page.pma);

        Ok(LoadedTexture {
            texture,
            width,
            height,
        })
    }
}

/// Decodes any image format enabled on the `image` crate into RGBA8.
pub fn decode_page_image(path: &str, bytes: &[u8]) -> Result<image::RgbaImage, Error> {
    let image = image::load_from_memory(bytes).map_err(|e| Error::Texture {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    let image = image.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Texture {
            path: path.to_string(),
            message: "image has no pixels".to_string(),
        });
    }
    Ok(image)
}

pub fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("spine page bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

pub fn create_sampler_for_atlas_page(device: &wgpu::Device, page: &AtlasPage) -> wgpu::Sampler {
    let filters = sampler_filters(&page.min_filter, &page.mag_filter);
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("spine page sampler"),
        mag_filter: filters.mag,
        min_filter: filters.min,
        mipmap_filter: filters.mipmap,
        address_mode_u: address_mode(page.wrap_u),
        address_mode_v: address_mode(page.wrap_v),
        ..Default::default()
    })
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct SamplerFilters {
    pub min: wgpu::FilterMode,
    pub mag: wgpu::FilterMode,
    pub mipmap: wgpu::FilterMode,
}

pub(crate) fn sampler_filters(min: &AtlasFilter, mag: &AtlasFilter) -> SamplerFilters {
    use wgpu::FilterMode::{Linear, Nearest};

    // (min, mipmap); the page has a single mip level, so mipmap only matters if one is added.
    let (min, mipmap) = match min {
        AtlasFilter::Nearest | AtlasFilter::MipMapNearestNearest => (Nearest, Nearest),
        AtlasFilter::MipMapNearestLinear => (Nearest, Linear),
        AtlasFilter::MipMap | AtlasFilter::MipMapLinearLinear => (Linear, Linear),
        AtlasFilter::Linear | AtlasFilter::MipMapLinearNearest | AtlasFilter::Other(_) => {
            (Linear, Nearest)
        }
    };
    let mag = match mag {
        AtlasFilter::Nearest
        | AtlasFilter::MipMapNearestNearest
        | AtlasFilter::MipMapLinearNearest => Nearest,
        _ => Linear,
    };

    SamplerFilters { min, mag, mipmap }
}

pub(crate) fn address_mode(wrap: AtlasWrap) -> wgpu::AddressMode {
    match wrap {
        AtlasWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AtlasWrap::Repeat => wgpu::AddressMode::Repeat,
    }
}
