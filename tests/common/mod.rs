#![allow(dead_code)]

use std::path::Path;

use base64::Engine as _;
use scene_anim::{asset::buffer::MemorySource, config::ImportConfig, Asset, AssetParser, LoadError};
use serde_json::{json, Value};

/// Packs float arrays into one buffer and hands out accessor indices.
#[derive(Default)]
pub struct BufferBuilder {
    pub bytes: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `kind` is the accessor type (SCALAR, VEC3, VEC4, MAT4 ..)
    pub fn floats(&mut self, data: &[f32], kind: &str) -> usize {
        let components = match kind {
            "SCALAR" => 1,
            "VEC2" => 2,
            "VEC3" => 3,
            "VEC4" => 4,
            "MAT4" => 16,
            other => panic!("unsupported accessor type {}", other),
        };
        assert_eq!(data.len() % components, 0);

        let mut min = vec![f32::MAX; components];
        let mut max = vec![f32::MIN; components];
        for element in data.chunks(components) {
            for (c, &v) in element.iter().enumerate() {
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }

        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(bytemuck::cast_slice(data));

        self.views.push(json!({ "buffer": 0, "byteOffset": offset, "byteLength": data.len() * 4 }));
        let mut accessor = json!({
            "bufferView": self.views.len() - 1,
            "componentType": 5126,
            "count": data.len() / components,
            "type": kind,
        });
        if kind != "MAT4" {
            accessor["min"] = json!(min);
            accessor["max"] = json!(max);
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub fn data_uri(&self) -> String {
        format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Fills `buffers`, `bufferViews` and `accessors` of `doc` with an inline buffer.
    pub fn embed(&self, doc: &mut Value) {
        doc["buffers"] = json!([{ "uri": self.data_uri(), "byteLength": self.bytes.len() }]);
        self.fill_tables(doc);
    }

    /// Same as `embed` but the buffer is an external file named `uri`.
    pub fn reference(&self, doc: &mut Value, uri: &str) {
        doc["buffers"] = json!([{ "uri": uri, "byteLength": self.bytes.len() }]);
        self.fill_tables(doc);
    }

    fn fill_tables(&self, doc: &mut Value) {
        doc["bufferViews"] = json!(self.views);
        doc["accessors"] = json!(self.accessors);
        if doc.get("asset").is_none() {
            doc["asset"] = json!({ "version": "2.0" });
        }
    }
}

pub fn parse(doc: &Value) -> Result<Asset, LoadError> {
    let source = MemorySource::new();
    AssetParser::new(&source, ImportConfig::default()).parse(doc.to_string().as_bytes(), Path::new(""))
}

/// Node 0 moves from (0,0,0) to (10,0,0) over 30 frames at `fps`.
pub fn translation_clip(fps: f32) -> Value {
    let mut buffers = BufferBuilder::new();
    let times = buffers.floats(&[0.0, 30.0 / fps], "SCALAR");
    let values = buffers.floats(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0], "VEC3");
    let mut doc = json!({
        "nodes": [ { "name": "mover" } ],
        "animations": [ {
            "name": "slide",
            "channels": [ { "sampler": 0, "target": { "node": 0, "path": "translation" } } ],
            "samplers": [ { "input": times, "output": values, "interpolation": "LINEAR" } ]
        } ]
    });
    buffers.embed(&mut doc);
    doc
}

pub fn assert_mat_eq(a: glam::Mat4, b: glam::Mat4) {
    assert!(a.abs_diff_eq(b, 1e-4), "{:?}\n!=\n{:?}", a, b);
}
