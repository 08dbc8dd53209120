use crate::{
    DrawCommand, DrawSink, Error, LoadedTexture, MemoryAssets, Primitive, TextureLoader, Vertex,
};
use spine2d::{AtlasPage, BlendMode};
use std::collections::HashMap;

pub(crate) const SKELETON_JSON: &str = r#"
{
  "skeleton": { "spine": "4.3.00" },
  "bones": [
    { "name": "root" },
    { "name": "arm", "parent": "root", "x": 10 }
  ],
  "slots": [
    { "name": "body", "bone": "root", "attachment": "body" },
    { "name": "glow", "bone": "root", "attachment": "glow", "blend": "additive" },
    { "name": "cape", "bone": "arm", "attachment": "cape" },
    { "name": "hitbox", "bone": "root", "attachment": "hitbox" }
  ],
  "skins": {
    "default": {
      "body": { "body": { "type": "region", "path": "body", "width": 4, "height": 2 } },
      "glow": { "glow": { "type": "region", "path": "glow", "width": 2, "height": 2 } },
      "cape": {
        "cape": {
          "type": "mesh",
          "path": "cape",
          "uvs": [0,0, 1,0, 1,1, 0,1],
          "vertices": [0,0, 2,0, 2,2, 0,2],
          "triangles": [0,1,2, 2,3,0]
        }
      },
      "hitbox": { "hitbox": { "type": "boundingbox", "vertexCount": 4, "vertices": [-5,-5, 5,-5, 5,5, -5,5] } }
    },
    "red": {
      "body": { "body": { "type": "region", "path": "body", "width": 4, "height": 2, "color": "ff0000ff" } }
    }
  },
  "events": {
    "footstep": { "int": 3, "float": 0.5, "string": "left" }
  },
  "animations": {
    "walk": {
      "bones": {
        "arm": {
          "rotate": [
            { "time": 0.0, "value": 0.0 },
            { "time": 1.0, "value": 90.0 }
          ]
        }
      },
      "events": [ { "time": 0.5, "name": "footstep" } ]
    },
    "death": {
      "bones": {
        "root": {
          "rotate": [
            { "time": 0.0, "value": 0.0 },
            { "time": 2.0, "value": 0.0 }
          ]
        }
      }
    }
  }
}
"#;

pub(crate) const ATLAS: &str = r#"
page.png
size: 64,32

body
  rotate: false
  xy: 0, 0
  size: 8, 4
cape
  rotate: false
  xy: 16, 0
  size: 16, 16

fx.png
size: 16,16
pma: true

glow
  rotate: false
  xy: 0, 0
  size: 4, 4
"#;

pub(crate) fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

pub(crate) fn assets() -> MemoryAssets {
    MemoryAssets::new()
        .with("chars/hero.atlas", ATLAS)
        .with("chars/hero.json", SKELETON_JSON)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FakeTexture(pub String);

/// Hands out textures named after their path; sizes default to the atlas-declared size.
#[derive(Default)]
pub(crate) struct FakeTextures {
    pub sizes: HashMap<String, (u32, u32)>,
    pub loaded: Vec<String>,
}

impl TextureLoader for FakeTextures {
    type Texture = FakeTexture;

    fn load_texture(
        &mut self,
        path: &str,
        page: &AtlasPage,
    ) -> Result<LoadedTexture<FakeTexture>, Error> {
        self.loaded.push(path.to_string());
        let (width, height) = self
            .sizes
            .get(path)
            .copied()
            .unwrap_or((page.width, page.height));
        Ok(LoadedTexture {
            texture: FakeTexture(path.to_string()),
            width,
            height,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedCommand {
    pub texture: Option<FakeTexture>,
    pub blend: BlendMode,
    pub premultiplied_alpha: bool,
    pub primitive: Primitive,
    pub first_index: usize,
    pub index_count: usize,
    pub color: [f32; 4],
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub uploads: usize,
    pub commands: Vec<RecordedCommand>,
}

impl DrawSink<FakeTexture> for RecordingSink {
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) {
        self.vertices = vertices.to_vec();
        self.indices = indices.to_vec();
        self.uploads += 1;
    }

    fn add_draw_command(&mut self, command: DrawCommand<'_, FakeTexture>) {
        self.commands.push(RecordedCommand {
            texture: command.texture.cloned(),
            blend: command.blend,
            premultiplied_alpha: command.premultiplied_alpha,
            primitive: command.primitive,
            first_index: command.first_index,
            index_count: command.index_count,
            color: command.color,
        });
    }
}
