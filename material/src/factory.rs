//! Builds materials from loosely typed, tag-driven descriptions as produced by scene loaders.
//!
//! ```
//! use material::factory::{build, MaterialDesc};
//! use radiometry::color::Color;
//!
//! let glass = MaterialDesc::new("glass")
//!     .with("eta", 1.5f32)
//!     .with("roughness", 0.1f32);
//! let matte = MaterialDesc::new("matte").with("color", Color::gray(0.5));
//! let coated = MaterialDesc::new("layered").with("base", matte);
//! assert!(build(&glass).is_ok());
//! assert!(build(&coated).is_ok());
//! assert!(build(&MaterialDesc::new("velvet")).is_err());
//! ```

use crate::{BlendMap, FourierMaterial, Layered, Material, Matte, Microfacet, Mirror, WeightedSum};
use geometry::fourier::FourierError;
use radiometry::color::Color;
use std::{collections::BTreeMap, sync::Arc};
use texture::{Image, ImageError, Texture};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterialError {
    #[error("unknown material type {0:?}")]
    UnknownTag(String),

    #[error("{tag}: missing required parameter '{name}'")]
    MissingParam { tag: String, name: &'static str },

    #[error("{tag}: invalid parameter '{name}': {reason}")]
    InvalidParam {
        tag: String,
        name: &'static str,
        reason: String,
    },

    #[error("{tag}: {source}")]
    Nested {
        tag: String,
        #[source]
        source: Box<MaterialError>,
    },

    #[error("texture: {0}")]
    Texture(#[from] ImageError),

    #[error("fourier table: {0}")]
    Table(#[from] FourierError),
}

/// A parameter value in a material description.
#[derive(Debug, Clone)]
pub enum Param {
    Float(f32),
    Bool(bool),
    Color(Color),
    Floats(Vec<f32>),
    Text(String),
    Material(MaterialDesc),
    Materials(Vec<MaterialDesc>),
}

impl From<f32> for Param {
    fn from(x: f32) -> Self {
        Param::Float(x)
    }
}
impl From<bool> for Param {
    fn from(x: bool) -> Self {
        Param::Bool(x)
    }
}
impl From<Color> for Param {
    fn from(x: Color) -> Self {
        Param::Color(x)
    }
}
impl From<Vec<f32>> for Param {
    fn from(x: Vec<f32>) -> Self {
        Param::Floats(x)
    }
}
impl From<&str> for Param {
    fn from(x: &str) -> Self {
        Param::Text(x.to_owned())
    }
}
impl From<MaterialDesc> for Param {
    fn from(x: MaterialDesc) -> Self {
        Param::Material(x)
    }
}
impl From<Vec<MaterialDesc>> for Param {
    fn from(x: Vec<MaterialDesc>) -> Self {
        Param::Materials(x)
    }
}

/// A material type tag plus named parameters.
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub tag: String,
    pub params: BTreeMap<String, Param>,
}

impl MaterialDesc {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            params: BTreeMap::new(),
        }
    }

    pub fn with<P: Into<Param>>(mut self, name: &str, value: P) -> Self {
        self.params.insert(name.to_owned(), value.into());
        self
    }

    fn invalid(&self, name: &'static str, reason: &str) -> MaterialError {
        MaterialError::InvalidParam {
            tag: self.tag.clone(),
            name,
            reason: reason.to_owned(),
        }
    }

    fn missing(&self, name: &'static str) -> MaterialError {
        MaterialError::MissingParam {
            tag: self.tag.clone(),
            name,
        }
    }

    fn float_or(&self, name: &'static str, default: f32) -> Result<f32, MaterialError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(Param::Float(x)) if x.is_finite() => Ok(*x),
            Some(_) => Err(self.invalid(name, "expected a finite number")),
        }
    }

    fn bool_or(&self, name: &'static str, default: bool) -> Result<bool, MaterialError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(Param::Bool(x)) => Ok(*x),
            Some(_) => Err(self.invalid(name, "expected a boolean")),
        }
    }

    fn color(&self, name: &'static str) -> Result<Option<Color>, MaterialError> {
        match self.params.get(name) {
            None => Ok(None),
            Some(Param::Color(c)) if c.is_finite() => Ok(Some(*c)),
            Some(Param::Float(x)) if x.is_finite() => Ok(Some(Color::gray(*x))),
            Some(_) => Err(self.invalid(name, "expected a color")),
        }
    }

    fn text(&self, name: &'static str) -> Result<Option<&str>, MaterialError> {
        match self.params.get(name) {
            None => Ok(None),
            Some(Param::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(name, "expected a string")),
        }
    }

    fn material(&self, name: &'static str) -> Result<Arc<dyn Material>, MaterialError> {
        match self.params.get(name) {
            None => Err(self.missing(name)),
            Some(Param::Material(desc)) => build(desc).map_err(|e| MaterialError::Nested {
                tag: format!("{}.{}", self.tag, name),
                source: Box::new(e),
            }),
            Some(_) => Err(self.invalid(name, "expected a material")),
        }
    }
}

/// Constructs the material described by `desc`. Nested materials are built recursively.
///
/// Recognized tags: `matte`, `mirror`, `glass` (alias `dielectric`), `metal`, `layered`
/// (alias `layer`), `blend` (alias `blend_map`), `mixture` (alias `weighted_sum`), `fourier`.
pub fn build(desc: &MaterialDesc) -> Result<Arc<dyn Material>, MaterialError> {
    let material: Arc<dyn Material> = match desc.tag.as_str() {
        "matte" => Arc::new(build_matte(desc)?),
        "mirror" => Arc::new(Mirror::new()),
        "glass" | "dielectric" => {
            if desc.tag == "dielectric" {
                log::warn!("material type \"dielectric\" is built as \"glass\"");
            }
            Arc::new(Microfacet::dielectric(
                desc.color("color")?.unwrap_or_else(Color::white),
                desc.color("reflection_color")?.unwrap_or_else(Color::white),
                desc.float_or("eta", 1.5)?,
                desc.float_or("roughness", 0.0)?,
            ))
        }
        "metal" => Arc::new(build_metal(desc)?),
        "layered" | "layer" => {
            let eta = desc.float_or("eta", 1.5)?;
            if !(eta > 0.0) {
                return Err(desc.invalid("eta", "must be positive"));
            }
            Arc::new(Layered::new(desc.material("base")?, eta))
        }
        "blend" | "blend_map" => {
            let path = desc.text("map")?.ok_or_else(|| desc.missing("map"))?;
            let map: Arc<dyn Texture> = Arc::new(Image::load_png(path)?);
            Arc::new(BlendMap::new(
                desc.material("black")?,
                desc.material("white")?,
                map,
            ))
        }
        "mixture" | "weighted_sum" => Arc::new(build_mixture(desc)?),
        "fourier" => {
            let path = desc.text("path")?.ok_or_else(|| desc.missing("path"))?;
            Arc::new(FourierMaterial::open(path)?)
        }
        other => return Err(MaterialError::UnknownTag(other.to_owned())),
    };
    Ok(material)
}

fn build_matte(desc: &MaterialDesc) -> Result<Matte, MaterialError> {
    let roughness = desc.float_or("roughness", 0.0)?;
    let transparent = desc.bool_or("transparent", false)?;
    if roughness < 0.0 {
        return Err(desc.invalid("roughness", "must not be negative"));
    }
    if let Some(path) = desc.text("texture")? {
        let image = Image::load_png(path)?;
        return Ok(Matte::textured(Arc::new(image), roughness, transparent));
    }
    match desc.color("color")? {
        Some(color) => Ok(Matte::solid(color, roughness, transparent)),
        None => Err(desc.missing("color")),
    }
}

/// A metal with an explicit `color` reflects that color regardless of the angle. Without one,
/// the complex index defaults to an approximation of aluminium.
fn build_metal(desc: &MaterialDesc) -> Result<Microfacet, MaterialError> {
    let roughness = desc.float_or("roughness", 0.0)?;
    if let Some(color) = desc.color("color")? {
        return Ok(Microfacet::tinted_metal(color, roughness));
    }
    let n = desc
        .color("eta")?
        .unwrap_or_else(|| Color::new(1.44, 1.21, 0.89));
    let k = desc
        .color("k")?
        .unwrap_or_else(|| Color::new(6.98, 6.32, 5.40));
    Ok(Microfacet::metal(n, k, roughness))
}

fn build_mixture(desc: &MaterialDesc) -> Result<WeightedSum, MaterialError> {
    let descs = match desc.params.get("materials") {
        Some(Param::Materials(list)) => list,
        Some(_) => return Err(desc.invalid("materials", "expected a list of materials")),
        None => return Err(desc.missing("materials")),
    };
    let weights = match desc.params.get("weights") {
        Some(Param::Floats(w)) => w.clone(),
        Some(_) => return Err(desc.invalid("weights", "expected a list of numbers")),
        None => vec![1.0; descs.len()],
    };
    if weights.len() != descs.len() {
        return Err(desc.invalid("weights", "length differs from 'materials'"));
    }
    let materials = descs
        .iter()
        .enumerate()
        .map(|(i, d)| {
            build(d).map_err(|e| MaterialError::Nested {
                tag: format!("{}.materials[{}]", desc.tag, i),
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    WeightedSum::new(materials, weights)
        .ok_or_else(|| desc.invalid("weights", "must have a positive sum"))
}
