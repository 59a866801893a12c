use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal to the asset being imported. Nothing partially loaded is handed out.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed binary container: {0}")]
    Glb(String),

    #[error("buffer {buffer}: declared {declared} bytes but only {actual} available")]
    ShortBuffer { buffer: usize, declared: usize, actual: usize },

    #[error("buffer {buffer}: declared {declared} bytes exceeds the {limit} byte limit")]
    BufferTooLarge { buffer: usize, declared: usize, limit: usize },

    #[error("buffer {buffer}: malformed base64 payload ({reason})")]
    Base64 { buffer: usize, reason: String },

    #[error("buffer {buffer}: unsupported uri {uri:?}")]
    UnsupportedUri { buffer: usize, uri: String },

    #[error("{referrer} references {table}[{index}] but only {len} exist")]
    MissingIndex {
        table: &'static str,
        index: usize,
        len: usize,
        referrer: String,
    },

    #[error("buffer view {view}: range {offset}+{length} exceeds buffer of {buffer_len} bytes")]
    BufferViewRange {
        view: usize,
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("accessor {accessor}: needs {required} bytes but its buffer view holds {available}")]
    AccessorRange {
        accessor: usize,
        required: usize,
        available: usize,
    },

    #[error("accessor {accessor}: {reason}")]
    AccessorLayout { accessor: usize, reason: String },

    #[error("skin {skin}: {matrices} inverse bind matrices for {joints} joints")]
    SkinMatrixCount {
        skin: usize,
        matrices: usize,
        joints: usize,
    },

    #[error("node {child} is a child of both node {first} and node {second}")]
    MultipleParents {
        child: usize,
        first: usize,
        second: usize,
    },

    #[error("node {node} lists itself as a child")]
    SelfParent { node: usize },

    #[error("node {node} is its own ancestor")]
    Cycle { node: usize },

    #[error("node {node} has both a matrix and translation/rotation/scale")]
    MatrixAndTrs { node: usize },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Io { path: path.into(), source }
    }

    pub fn missing(table: &'static str, index: usize, len: usize, referrer: impl Into<String>) -> Self {
        LoadError::MissingIndex { table, index, len, referrer: referrer.into() }
    }
}

/// Content or programmer errors found while sampling an animation.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("animation {animation} does not exist ({len} loaded)")]
    AnimationOutOfRange { animation: usize, len: usize },

    #[error("animation {animation} channel {channel}: sampler {sampler} does not exist ({len} defined)")]
    SamplerOutOfRange {
        animation: usize,
        channel: usize,
        sampler: usize,
        len: usize,
    },

    #[error("animation {animation} channel {channel}: target node {node} does not exist ({len} nodes)")]
    NodeOutOfRange {
        animation: usize,
        channel: usize,
        node: usize,
        len: usize,
    },

    #[error("animation {animation} sampler {sampler}: {values} output elements for {times} keyframes, expected {expected}")]
    KeyframeCountMismatch {
        animation: usize,
        sampler: usize,
        times: usize,
        values: usize,
        expected: usize,
    },

    #[error("animation {animation} sampler {sampler} has no keyframes")]
    EmptySampler { animation: usize, sampler: usize },

    #[error("animation {animation} channel {channel}: {path} expects {expected} components per element, output has {found}")]
    UnexpectedComponents {
        animation: usize,
        channel: usize,
        path: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Accessor(#[from] LoadError),
}
