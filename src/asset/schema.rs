//! Serde mirror of the scene description document.
//!
//! Optional fields are filled with the interchange format's defaults at parse
//! time so downstream code never has to re-apply them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

fn default_one() -> f32 { 1.0 }
fn default_alpha_cutoff() -> f32 { 0.5 }
fn default_base_color() -> [f32; 4] { [1.0; 4] }
fn default_wrap() -> WrapMode { WrapMode::Repeat }

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ComponentType {
    SignedByte = 5120,
    UnsignedByte = 5121,
    SignedShort = 5122,
    UnsignedShort = 5123,
    UnsignedInt = 5125,
    Float = 5126,
}
impl ComponentType {
    // size in bytes
    pub fn size(self) -> usize {
        match self {
            ComponentType::SignedByte | ComponentType::UnsignedByte => 1,
            ComponentType::SignedShort | ComponentType::UnsignedShort => 2,
            ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorType {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC2")]
    Vec2,
    #[serde(rename = "VEC3")]
    Vec3,
    #[serde(rename = "VEC4")]
    Vec4,
    #[serde(rename = "MAT2")]
    Mat2,
    #[serde(rename = "MAT3")]
    Mat3,
    #[serde(rename = "MAT4")]
    Mat4,
}
impl AccessorType {
    pub fn component_count(self) -> usize {
        match self {
            AccessorType::Scalar => 1,
            AccessorType::Vec2 => 2,
            AccessorType::Vec3 => 3,
            AccessorType::Vec4 => 4,
            AccessorType::Mat2 => 4,
            AccessorType::Mat3 => 9,
            AccessorType::Mat4 => 16,
        }
    }

    pub fn columns(self) -> usize {
        match self {
            AccessorType::Mat2 => 2,
            AccessorType::Mat3 => 3,
            AccessorType::Mat4 => 4,
            _ => 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AssetInfo {
    pub version: String,
    pub generator: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Buffer {
    pub uri: Option<String>,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    pub name: Option<String>,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BufferViewTarget {
    ArrayBuffer = 34962,
    ElementArrayBuffer = 34963,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BufferView {
    pub buffer: usize,
    #[serde(rename = "byteOffset", default)]
    pub byte_offset: usize,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(rename = "byteStride")]
    pub byte_stride: Option<usize>,
    pub target: Option<BufferViewTarget>,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SparseIndices {
    #[serde(rename = "bufferView")]
    pub buffer_view: usize,
    #[serde(rename = "byteOffset", default)]
    pub byte_offset: usize,
    #[serde(rename = "componentType")]
    pub component_type: ComponentType,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SparseValues {
    #[serde(rename = "bufferView")]
    pub buffer_view: usize,
    #[serde(rename = "byteOffset", default)]
    pub byte_offset: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Accessor {
    #[serde(rename = "bufferView")]
    pub buffer_view: Option<usize>,
    #[serde(rename = "byteOffset", default)]
    pub byte_offset: usize,
    #[serde(rename = "componentType")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub accessor_type: AccessorType,
    pub min: Option<Vec<f32>>,
    pub max: Option<Vec<f32>>,
    pub sparse: Option<Sparse>,
    pub name: Option<String>,
}
impl Accessor {
    /// Bytes from one matrix column to the next. Matrix columns start on
    /// 4-byte boundaries, so MAT2/MAT3 of bytes or shorts carry padding.
    /// Non-matrix elements are a single unpadded column.
    pub fn column_stride(&self) -> usize {
        let columns = self.accessor_type.columns();
        let column = self.component_type.size() * self.accessor_type.component_count() / columns;
        if columns > 1 {
            column.next_multiple_of(4)
        } else {
            column
        }
    }

    pub fn element_size(&self) -> usize {
        self.column_stride() * self.accessor_type.columns()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Image {
    pub name: Option<String>,
    pub uri: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(rename = "bufferView")]
    pub buffer_view: Option<usize>,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MagFilter {
    Nearest = 9728,
    Linear = 9729,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MinFilter {
    Nearest = 9728,
    Linear = 9729,
    NearestMipmapNearest = 9984,
    LinearMipmapNearest = 9985,
    NearestMipmapLinear = 9986,
    LinearMipmapLinear = 9987,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WrapMode {
    ClampToEdge = 33071,
    MirroredRepeat = 33648,
    Repeat = 10497,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Sampler {
    pub name: Option<String>,
    #[serde(rename = "magFilter")]
    pub mag_filter: Option<MagFilter>,
    #[serde(rename = "minFilter")]
    pub min_filter: Option<MinFilter>,
    #[serde(rename = "wrapS", default = "default_wrap")]
    pub wrap_s: WrapMode,
    #[serde(rename = "wrapT", default = "default_wrap")]
    pub wrap_t: WrapMode,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Texture {
    pub name: Option<String>,
    pub sampler: Option<usize>,
    pub source: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TextureInfo {
    pub index: usize,
    #[serde(rename = "texCoord", default)]
    pub tex_coord: usize,
    /// normal textures only
    #[serde(default = "default_one")]
    pub scale: f32,
    /// occlusion textures only
    #[serde(default = "default_one")]
    pub strength: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PbrMetallicRoughness {
    #[serde(rename = "baseColorFactor", default = "default_base_color")]
    pub base_color_factor: [f32; 4],
    #[serde(rename = "baseColorTexture")]
    pub base_color_texture: Option<TextureInfo>,
    #[serde(rename = "metallicFactor", default = "default_one")]
    pub metallic_factor: f32,
    #[serde(rename = "roughnessFactor", default = "default_one")]
    pub roughness_factor: f32,
    #[serde(rename = "metallicRoughnessTexture")]
    pub metallic_roughness_texture: Option<TextureInfo>,
}
impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: default_base_color(),
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    #[serde(rename = "OPAQUE")]
    Opaque,
    #[serde(rename = "MASK")]
    Mask,
    #[serde(rename = "BLEND")]
    Blend,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    #[serde(rename = "pbrMetallicRoughness", default)]
    pub pbr_metallic_roughness: PbrMetallicRoughness,
    #[serde(rename = "normalTexture")]
    pub normal_texture: Option<TextureInfo>,
    #[serde(rename = "occlusionTexture")]
    pub occlusion_texture: Option<TextureInfo>,
    #[serde(rename = "emissiveTexture")]
    pub emissive_texture: Option<TextureInfo>,
    #[serde(rename = "emissiveFactor", default)]
    pub emissive_factor: [f32; 3],
    #[serde(rename = "alphaMode", default)]
    pub alpha_mode: AlphaMode,
    #[serde(rename = "alphaCutoff", default = "default_alpha_cutoff")]
    pub alpha_cutoff: f32,
    #[serde(rename = "doubleSided", default)]
    pub double_sided: bool,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    #[default]
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Primitive {
    /// attribute semantic (POSITION, NORMAL, TEXCOORD_n, JOINTS_n, WEIGHTS_n ..) -> accessor
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    #[serde(default)]
    pub mode: PrimitiveMode,
    #[serde(default)]
    pub targets: Vec<BTreeMap<String, usize>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub weights: Option<Vec<f32>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub camera: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    pub skin: Option<usize>,
    /// column-major
    pub matrix: Option<[f32; 16]>,
    pub mesh: Option<usize>,
    /// xyzw
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
    pub translation: Option<[f32; 3]>,
    pub weights: Option<Vec<f32>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Skin {
    pub name: Option<String>,
    #[serde(rename = "inverseBindMatrices")]
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
    pub joints: Vec<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "STEP")]
    Step,
    #[serde(rename = "CUBICSPLINE")]
    CubicSpline,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}
impl TargetPath {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetPath::Translation => "translation",
            TargetPath::Rotation => "rotation",
            TargetPath::Scale => "scale",
            TargetPath::Weights => "weights",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChannelTarget {
    pub node: Option<usize>,
    pub path: TargetPath,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnimationChannel {
    pub sampler: usize,
    pub target: ChannelTarget,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnimationSampler {
    pub input: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
    pub output: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Animation {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannel>,
    pub samplers: Vec<AnimationSampler>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Scene {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Document {
    pub asset: AssetInfo,
    pub buffers: Vec<Buffer>,
    #[serde(rename = "bufferViews")]
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
    pub samplers: Vec<Sampler>,
    pub skins: Vec<Skin>,
    pub animations: Vec<Animation>,
    pub scenes: Vec<Scene>,
    pub scene: Option<usize>,
}
