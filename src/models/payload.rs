use crate::error::{NodeError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Upper bound on the JSON header, matching the reference safetensors reader
const MAX_HEADER_LEN: u64 = 100_000_000;
const METADATA_KEY: &str = "__metadata__";

/// Location and layout of one tensor inside the data buffer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TensorInfo {
    pub dtype: String,
    pub shape: Vec<usize>,
    pub data_offsets: (usize, usize),
}

impl TensorInfo {
    /// Number of bytes the tensor occupies in the data buffer
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.data_offsets.1 - self.data_offsets.0
    }
}

/// A safetensors file held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct SafetensorsPayload {
    metadata: BTreeMap<String, String>,
    tensors: BTreeMap<String, TensorInfo>,
    data: Vec<u8>,
}

impl SafetensorsPayload {
    /// Read and validate a safetensors file
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes).map_err(|e| match e {
            NodeError::InvalidArtifact(msg) => {
                NodeError::InvalidArtifact(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse a safetensors buffer: u64 LE header length, JSON header, raw data
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self> {
        let header_len = Cursor::new(&bytes)
            .read_u64::<LittleEndian>()
            .map_err(|_| invalid("file is shorter than the 8-byte header length"))?;

        if header_len > MAX_HEADER_LEN {
            return Err(invalid(format!("header length {header_len} is too large")));
        }

        #[allow(clippy::cast_possible_truncation)]
        let header_end = 8 + header_len as usize;
        if header_end > bytes.len() {
            return Err(invalid(format!(
                "header length {header_len} exceeds file size {}",
                bytes.len()
            )));
        }

        let header: BTreeMap<String, serde_json::Value> =
            serde_json::from_slice(&bytes[8..header_end])
                .map_err(|e| invalid(format!("malformed header: {e}")))?;

        let data = bytes.split_off(header_end);
        let mut metadata = BTreeMap::new();
        let mut tensors = BTreeMap::new();

        for (name, value) in header {
            if name == METADATA_KEY {
                metadata = serde_json::from_value(value)
                    .map_err(|e| invalid(format!("malformed {METADATA_KEY}: {e}")))?;
                continue;
            }

            let info: TensorInfo = serde_json::from_value(value)
                .map_err(|e| invalid(format!("malformed entry for tensor '{name}': {e}")))?;
            validate_tensor(&name, &info, data.len())?;
            tensors.insert(name, info);
        }

        Ok(Self {
            metadata,
            tensors,
            data,
        })
    }

    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    #[must_use]
    pub const fn tensors(&self) -> &BTreeMap<String, TensorInfo> {
        &self.tensors
    }

    #[must_use]
    pub fn tensor(&self, name: &str) -> Option<&TensorInfo> {
        self.tensors.get(name)
    }

    /// Raw little-endian bytes of a tensor
    #[must_use]
    pub fn tensor_data(&self, name: &str) -> Option<&[u8]> {
        self.tensors
            .get(name)
            .map(|info| &self.data[info.data_offsets.0..info.data_offsets.1])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

fn invalid(msg: impl Into<String>) -> NodeError {
    NodeError::InvalidArtifact(msg.into())
}

fn dtype_size(dtype: &str) -> Option<usize> {
    match dtype {
        "BOOL" | "U8" | "I8" | "F8_E4M3" | "F8_E5M2" => Some(1),
        "U16" | "I16" | "F16" | "BF16" => Some(2),
        "U32" | "I32" | "F32" => Some(4),
        "U64" | "I64" | "F64" => Some(8),
        _ => None,
    }
}

fn validate_tensor(name: &str, info: &TensorInfo, data_len: usize) -> Result<()> {
    let (start, end) = info.data_offsets;
    if start > end || end > data_len {
        return Err(invalid(format!(
            "tensor '{name}' offsets {start}..{end} fall outside {data_len} data bytes"
        )));
    }

    // unknown dtypes are passed through to the host untouched
    if let Some(size) = dtype_size(&info.dtype) {
        let expected = info
            .shape
            .iter()
            .try_fold(size, |acc, &dim| acc.checked_mul(dim));
        if expected != Some(end - start) {
            return Err(invalid(format!(
                "tensor '{name}' has {} bytes, shape {:?} of {} needs {expected:?}",
                end - start,
                info.shape,
                info.dtype
            )));
        }
    }

    Ok(())
}

/// Reads an artifact file into memory
pub trait ArtifactLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<SafetensorsPayload>;
}

/// Default loader for safetensors files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetensorsLoader;

impl ArtifactLoader for SafetensorsLoader {
    fn load(&self, path: &Path) -> Result<SafetensorsPayload> {
        tracing::debug!("Loading safetensors file {}", path.display());
        SafetensorsPayload::read(path)
    }
}

/// Serialize tensors into safetensors bytes. Test fixtures only.
#[cfg(test)]
pub(crate) fn encode_safetensors(tensors: &[(&str, &str, Vec<usize>, Vec<u8>)]) -> Vec<u8> {
    let mut header = serde_json::Map::new();
    let mut data = Vec::new();
    for (name, dtype, shape, bytes) in tensors {
        let start = data.len();
        data.extend_from_slice(bytes);
        header.insert(
            (*name).to_string(),
            serde_json::json!({ "dtype": dtype, "shape": shape, "data_offsets": [start, data.len()] }),
        );
    }
    header.insert(
        METADATA_KEY.to_string(),
        serde_json::json!({ "format": "pt" }),
    );

    let header = serde_json::to_vec(&header).unwrap();
    let mut out = (header.len() as u64).to_le_bytes().to_vec();
    out.extend_from_slice(&header);
    out.extend_from_slice(&data);
    out
}
