use crate::decode_page_image;
use crate::texture::{SamplerFilters, address_mode, sampler_filters};
use spine_drawable::Error;
use spine2d::{AtlasFilter, AtlasWrap};
use std::io::Cursor;
use wgpu::FilterMode::{Linear, Nearest};

#[test]
fn decodes_png_pages_to_rgba8() {
    let mut source = image::RgbaImage::new(2, 1);
    source.put_pixel(1, 0, image::Rgba([10, 20, 30, 40]));
    let mut bytes = Vec::new();
    source
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_page_image("page.png", &bytes).unwrap();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.get_pixel(1, 0).0, [10, 20, 30, 40]);
}

#[test]
fn undecodable_page_is_a_texture_error() {
    let err = decode_page_image("page.png", b"not a png").unwrap_err();
    assert!(matches!(err, Error::Texture { path, .. } if path == "page.png"));
}

#[test]
fn atlas_filters_map_to_sampler_filters() {
    assert_eq!(
        sampler_filters(&AtlasFilter::Nearest, &AtlasFilter::Nearest),
        SamplerFilters {
            min: Nearest,
            mag: Nearest,
            mipmap: Nearest,
        }
    );
    assert_eq!(
        sampler_filters(&AtlasFilter::MipMapLinearLinear, &AtlasFilter::Linear),
        SamplerFilters {
            min: Linear,
            mag: Linear,
            mipmap: Linear,
        }
    );
    assert_eq!(
        sampler_filters(&AtlasFilter::Other("Foo".to_string()), &AtlasFilter::MipMap),
        SamplerFilters {
            min: Linear,
            mag: Linear,
            mipmap: Nearest,
        }
    );
}

#[test]
fn atlas_wrap_maps_to_address_mode() {
    assert_eq!(
        address_mode(AtlasWrap::ClampToEdge),
        wgpu::AddressMode::ClampToEdge
    );
    assert_eq!(address_mode(AtlasWrap::Repeat), wgpu::AddressMode::Repeat);
}
