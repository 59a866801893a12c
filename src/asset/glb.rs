use crate::error::LoadError;

const MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

pub struct Glb<'a> {
    pub version: u32,
    pub length: u32,
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == MAGIC
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, LoadError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| LoadError::Glb(format!("truncated at byte {}", at)))
}

fn read_chunk(bytes: &[u8], at: usize) -> Result<(u32, &[u8], usize), LoadError> {
    let chunk_length = read_u32(bytes, at)? as usize;
    let chunk_type = read_u32(bytes, at + 4)?;
    let start = at + CHUNK_HEADER_LEN;
    let data = bytes
        .get(start..start + chunk_length)
        .ok_or_else(|| LoadError::Glb(format!("chunk at byte {} claims {} bytes past the end", at, chunk_length)))?;
    Ok((chunk_type, data, start + chunk_length))
}

impl<'a> Glb<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, LoadError> {
        if !is_glb(bytes) {
            return Err(LoadError::Glb("missing glTF magic".to_string()));
        }
        let version = read_u32(bytes, 4)?;
        if version != 2 {
            return Err(LoadError::Glb(format!("unsupported container version {}", version)));
        }
        let length = read_u32(bytes, 8)?;
        if length as usize > bytes.len() {
            return Err(LoadError::Glb(format!("header declares {} bytes, file has {}", length, bytes.len())));
        }
        let bytes = &bytes[..length as usize];

        let (json_type, json, next) = read_chunk(bytes, HEADER_LEN)?;
        if json_type != CHUNK_JSON {
            return Err(LoadError::Glb("first chunk is not JSON".to_string()));
        }

        let bin = if next < bytes.len() {
            let (bin_type, bin, _) = read_chunk(bytes, next)?;
            (bin_type == CHUNK_BIN).then_some(bin)
        } else {
            None
        };

        Ok(Self { version, length, json, bin })
    }
}

#[cfg(test)]
pub(crate) fn build(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    fn pad(mut data: Vec<u8>, fill: u8) -> Vec<u8> {
        while data.len() % 4 != 0 {
            data.push(fill);
        }
        data
    }
    let json = pad(json.to_vec(), b' ');
    let bin = bin.map(|b| pad(b.to_vec(), 0));
    let total = HEADER_LEN + CHUNK_HEADER_LEN + json.len() + bin.as_ref().map_or(0, |b| CHUNK_HEADER_LEN + b.len());

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    if let Some(bin) = bin {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }
    out
}
