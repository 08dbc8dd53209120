use crate::{Error, MAX_MESH_VERTICES};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AnimationMix {
    pub from: String,
    pub to: String,
    pub duration: f32,
}

/// Load-time settings for a [`crate::SpineDrawable`].
///
/// Every field is optional when deserialized:
///
/// ```json
/// { "scale": 0.6, "skin": "goblin", "mixes": [{ "from": "walk", "to": "death", "duration": 0.5 }] }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DrawableConfig {
    /// Scale applied to skeleton coordinates while parsing the JSON.
    pub scale: f32,
    pub skin: Option<String>,
    pub time_scale: f32,
    pub default_mix: f32,
    pub mixes: Vec<AnimationMix>,
    pub max_vertices: usize,
    pub offset: [f32; 2],
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for DrawableConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            skin: None,
            time_scale: 1.0,
            default_mix: 0.0,
            mixes: Vec::new(),
            max_vertices: MAX_MESH_VERTICES,
            offset: [0.0, 0.0],
            flip_x: false,
            flip_y: false,
        }
    }
}

impl DrawableConfig {
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_slice(input: &[u8]) -> Result<Self, Error> {
        let config: Self = serde_json::from_slice(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the value ranges that deserialization cannot express. Also run by
    /// [`crate::SpineDrawable::from_parts`] for configs built in code.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::Config {
                message: format!("scale must be finite and > 0, got {}", self.scale),
            });
        }
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(Error::Config {
                message: format!("time_scale must be finite and >= 0, got {}", self.time_scale),
            });
        }
        if !self.default_mix.is_finite() || self.default_mix < 0.0 {
            return Err(Error::Config {
                message: "default_mix must be finite and >= 0".to_string(),
            });
        }
        if self.max_vertices < 4 {
            return Err(Error::Config {
                message: "max_vertices must allow at least one quad".to_string(),
            });
        }
        Ok(())
    }
}
