use serde::{Deserialize, Serialize};

use rtsl_store::StoredShard;

use crate::error::{LibraryError, LibraryResult};
use crate::library::{AssetLibrary, ShardHandle};

pub const MAGIC: &[u8; 4] = b"RTSL";
pub const FORMAT_VERSION: u32 = 1;
pub(crate) const CHECKSUM_LEN: usize = 32;

/// Container header, stored bincode-encoded after magic and version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Header {
    pub folder: String,
    pub name: String,
    pub ordinal: u32,
    pub next_identity: u32,
    pub entry_count: u64,
}

/// An encoded library ready to be written.
#[derive(Clone, Debug)]
pub struct EncodedLibrary {
    pub key: String,
    pub ordinal: u32,
    pub records: usize,
    pub data: Vec<u8>,
    pub checksum: [u8; 32],
}

impl EncodedLibrary {
    pub fn handle(&self) -> ShardHandle {
        ShardHandle {
            key: self.key.clone(),
            ordinal: self.ordinal,
            records: self.records,
            checksum: hex::encode(self.checksum),
        }
    }

    pub fn to_shard(&self) -> StoredShard {
        StoredShard::new(self.key.clone(), self.data.clone())
    }
}

/// Encode a library into the `RTSL` container format.
///
/// Layout: magic, big-endian version, varint-length header, then per entry
/// a varint length, a big-endian CRC32 of the entry bytes and the entry
/// itself, trailed by a BLAKE3 checksum of everything before it.
pub fn encode_library(library: &AssetLibrary) -> LibraryResult<EncodedLibrary> {
    library.validate()?;
    let mut data = Vec::new();

    data.extend_from_slice(MAGIC);
    data.extend_from_slice(&FORMAT_VERSION.to_be_bytes());

    let header = Header {
        folder: library.folder.clone(),
        name: library.name.clone(),
        ordinal: library.ordinal,
        next_identity: library.next_identity,
        entry_count: library.entries.len() as u64,
    };
    let header_bytes = bincode::serialize(&header)?;
    encode_varint(&mut data, header_bytes.len() as u64);
    data.extend_from_slice(&header_bytes);

    for record in &library.entries {
        let bytes = bincode::serialize(record)?;
        encode_varint(&mut data, bytes.len() as u64);
        data.extend_from_slice(&crc32fast::hash(&bytes).to_be_bytes());
        data.extend_from_slice(&bytes);
    }

    let checksum = *blake3::hash(&data).as_bytes();
    data.extend_from_slice(&checksum);

    Ok(EncodedLibrary {
        key: library.key(),
        ordinal: library.ordinal,
        records: library.entries.len(),
        data,
        checksum,
    })
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> LibraryResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(LibraryError::Corrupt {
                offset: 0,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(LibraryError::Corrupt {
        offset: 0,
        reason: "truncated varint".into(),
    })
}
