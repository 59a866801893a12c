use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

use super::schema;
use crate::error::LoadError;

const DATA_URI_PREFIXES: [&str; 2] = [
    "data:application/octet-stream;base64,",
    "data:application/gltf-buffer;base64,",
];

// padding is stripped before decoding, so it is never required
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// The file-reading primitive the loader depends on.
pub trait FileSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

pub struct FsSource;
impl FileSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Serves files from memory, keyed by the exact path the loader asks for.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, Vec<u8>>,
}
impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }
}
impl FileSource for MemorySource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display())))
    }
}

fn is_base64(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'+' || c == b'/'
}

/// Decodes standard-alphabet base64. Stops at the first `=` and skips any
/// other byte outside the alphabet.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: Vec<u8> = payload
        .bytes()
        .take_while(|&c| c != b'=')
        .filter(|&c| is_base64(c))
        .collect();
    LENIENT_BASE64.decode(cleaned)
}

fn strip_data_uri(uri: &str) -> Option<&str> {
    DATA_URI_PREFIXES.iter().find_map(|prefix| uri.strip_prefix(prefix))
}

/// Owns every decoded binary payload of one asset.
#[derive(Debug, Default)]
pub struct ByteBufferStore {
    buffers: Vec<Box<[u8]>>,
}

impl ByteBufferStore {
    pub fn from_buffers(buffers: Vec<Vec<u8>>) -> Self {
        Self { buffers: buffers.into_iter().map(Vec::into_boxed_slice).collect() }
    }

    /// `glb_bin` is the BIN chunk of a binary container, consumed by the first
    /// buffer that declares no uri.
    pub fn load(
        buffers: &[schema::Buffer],
        base_path: &Path,
        source: &dyn FileSource,
        mut glb_bin: Option<Vec<u8>>,
        max_bytes: usize,
    ) -> Result<Self, LoadError> {
        let mut store = Vec::with_capacity(buffers.len());
        for (index, buffer) in buffers.iter().enumerate() {
            let declared = buffer.byte_length;
            if declared > max_bytes {
                return Err(LoadError::BufferTooLarge { buffer: index, declared, limit: max_bytes });
            }

            let mut bytes = match buffer.uri.as_deref() {
                Some(uri) => {
                    if let Some(payload) = strip_data_uri(uri) {
                        let bytes = decode_base64(payload).map_err(|e| LoadError::Base64 {
                            buffer: index,
                            reason: e.to_string(),
                        })?;
                        tracing::debug!("buffer {}: base64 uri decoded into {} bytes", index, bytes.len());
                        bytes
                    } else if uri.starts_with("data:") {
                        return Err(LoadError::UnsupportedUri { buffer: index, uri: uri.to_string() });
                    } else {
                        let path = base_path.join(uri);
                        let bytes = source.read(&path).map_err(|e| LoadError::io(&path, e))?;
                        tracing::debug!("buffer {}: {} read from file, {} bytes", index, path.display(), bytes.len());
                        bytes
                    }
                }
                None => glb_bin.take().ok_or_else(|| {
                    LoadError::Glb(format!("buffer {} has no uri and there is no BIN chunk", index))
                })?,
            };

            if bytes.len() < declared {
                return Err(LoadError::ShortBuffer { buffer: index, declared, actual: bytes.len() });
            }
            bytes.truncate(declared);
            store.push(bytes.into_boxed_slice());
        }
        Ok(Self { buffers: store })
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.buffers.get(index).map(|b| &b[..])
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
