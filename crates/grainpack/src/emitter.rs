//! Bundle container format
//!
//! A bundle carries the runtime shim, every resolved module and the root
//! module. Modules are always written sorted by qualified name so the same
//! inputs produce the same bytes.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use thiserror::Error;

/// Magic number for bundle files: "GRPK"
pub const MAGIC: [u8; 4] = *b"GRPK";

/// Current container version
pub const VERSION: u32 = 1;

/// Size of the fixed header (magic, version, checksum)
const HEADER_LEN: usize = 12;

/// Errors that can occur while encoding a bundle
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A string or count does not fit its u32 length field
    #[error("{what} is too large for the container: {len} exceeds u32::MAX")]
    TooLarge { what: &'static str, len: usize },
}

/// Errors that can occur while decoding a bundle
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Unexpected end of input
    #[error("Unexpected end of bundle at offset {0}")]
    UnexpectedEnd(usize),

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// Invalid magic number
    #[error("Invalid magic number: expected GRPK, got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {VERSION})")]
    UnsupportedVersion(u32),

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// A module name appears twice
    #[error("Duplicate module {0}")]
    DuplicateModule(String),

    /// Bytes left over after the root module
    #[error("{0} trailing bytes after bundle")]
    TrailingBytes(usize),
}

/// Everything needed to run a root module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    /// Runtime shim source, carried verbatim
    pub shim: String,

    /// Resolved modules keyed by qualified name
    pub modules: BTreeMap<String, Vec<u8>>,

    /// Root module bytes
    pub root: Vec<u8>,
}

impl Bundle {
    /// Assemble a bundle
    pub fn new(shim: impl Into<String>, modules: IndexMap<String, Vec<u8>>, root: Vec<u8>) -> Self {
        Self {
            shim: shim.into(),
            modules: modules.into_iter().collect(),
            root,
        }
    }

    /// Qualified names of the bundled modules, sorted
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Encode to the binary container format
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = BundleWriter::new();

        writer.emit_string(&self.shim)?;
        writer.emit_u32(u32_len(self.modules.len(), "module count")?);
        for (name, bytes) in &self.modules {
            writer.emit_string(name)?;
            writer.emit_blob(bytes);
        }
        writer.emit_blob(&self.root);

        let payload = writer.into_bytes();
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode from the binary container format
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BundleReader::new(data);

        let magic: [u8; 4] = reader.read_array()?;
        if magic != MAGIC {
            return Err(DecodeError::InvalidMagic(magic));
        }

        let version = reader.read_u32()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let stored_checksum = reader.read_u32()?;
        let calculated_checksum = crc32fast::hash(&data[HEADER_LEN..]);
        if stored_checksum != calculated_checksum {
            return Err(DecodeError::ChecksumMismatch {
                expected: stored_checksum,
                actual: calculated_checksum,
            });
        }

        let shim = reader.read_string()?;

        let count = reader.read_u32()? as usize;
        let mut modules = BTreeMap::new();
        for _ in 0..count {
            let name = reader.read_string()?;
            let bytes = reader.read_blob()?;
            if modules.insert(name.clone(), bytes).is_some() {
                return Err(DecodeError::DuplicateModule(name));
            }
        }

        let root = reader.read_blob()?;

        if reader.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            shim,
            modules,
            root,
        })
    }
}

/// Writer for the container payload
///
/// Strings carry a u32 length prefix, module blobs a u64 one.
pub struct BundleWriter {
    buffer: Vec<u8>,
}

impl BundleWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Consume the writer and return the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Emit a 32-bit unsigned integer (little-endian)
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 64-bit unsigned integer (little-endian)
    pub fn emit_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a length-prefixed UTF-8 string
    pub fn emit_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.emit_u32(u32_len(value.len(), "string")?);
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Emit a length-prefixed byte blob
    pub fn emit_blob(&mut self, bytes: &[u8]) {
        self.emit_u64(bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }
}

fn u32_len(len: usize, what: &'static str) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLarge { what, len })
}

impl Default for BundleWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader for the container format
pub struct BundleReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BundleReader<'a> {
    /// Create a new reader
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Read `len` bytes
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEnd(self.offset));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_slice(N)?);
        Ok(array)
    }

    /// Read a 32-bit unsigned integer (little-endian)
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a 64-bit unsigned integer (little-endian)
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u32()? as usize;
        let start = self.offset;
        let bytes = self.read_slice(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8(start))
    }

    /// Read a length-prefixed byte blob
    pub fn read_blob(&mut self) -> Result<Vec<u8>, DecodeError> {
        let at = self.offset;
        let len = usize::try_from(self.read_u64()?).map_err(|_| DecodeError::UnexpectedEnd(at))?;
        Ok(self.read_slice(len)?.to_vec())
    }
}
