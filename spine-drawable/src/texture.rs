use crate::Error;
use spine2d::AtlasPage;

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedTexture<T> {
    pub texture: T,
    pub width: u32,
    pub height: u32,
}

/// Creates host textures for atlas pages.
///
/// Called once per page when a drawable is created. The returned handle lives as long as the
/// drawable; dropping it releases the host texture.
pub trait TextureLoader {
    type Texture;

    fn load_texture(
        &mut self,
        path: &str,
        page: &AtlasPage,
    ) -> Result<LoadedTexture<Self::Texture>, Error>;
}

impl<L: TextureLoader + ?Sized> TextureLoader for &mut L {
    type Texture = L::Texture;

    fn load_texture(
        &mut self,
        path: &str,
        page: &AtlasPage,
    ) -> Result<LoadedTexture<Self::Texture>, Error> {
        (**self).load_texture(path, page)
    }
}
