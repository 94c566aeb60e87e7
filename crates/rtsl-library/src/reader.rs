use rtsl_types::SurrogateRecord;

use crate::error::{LibraryError, LibraryResult};
use crate::library::AssetLibrary;
use crate::writer::{decode_varint, Header, CHECKSUM_LEN, FORMAT_VERSION, MAGIC};

/// Hex BLAKE3 checksum stored in the trailer of an encoded container.
pub fn stored_checksum(data: &[u8]) -> Option<String> {
    let start = data.len().checked_sub(CHECKSUM_LEN)?;
    Some(hex::encode(&data[start..]))
}

/// Ordinal from the header of an `RTSL` container.
///
/// Only magic, version and header are read; the checksum and entries are
/// not, so a shard with a damaged body still reports its ordinal.
pub fn decode_ordinal(data: &[u8]) -> LibraryResult<u32> {
    check_preamble(data)?;
    let mut cursor = Cursor {
        data: &data[..data.len() - CHECKSUM_LEN],
        pos: 8,
    };
    let header: Header = bincode::deserialize(cursor.chunk("header")?)?;
    Ok(header.ordinal)
}

/// Decode and validate an `RTSL` container.
pub fn decode_library(data: &[u8]) -> LibraryResult<AssetLibrary> {
    check_preamble(data)?;
    let body_end = data.len() - CHECKSUM_LEN;
    let body = &data[..body_end];
    if blake3::hash(body).as_bytes() != &data[body_end..] {
        return Err(LibraryError::ChecksumMismatch {
            key: "<unknown>".into(),
        });
    }

    let mut cursor = Cursor { data: body, pos: 8 };
    let header_bytes = cursor.chunk("header")?;
    let header: Header = bincode::deserialize(header_bytes)?;

    let count = usize::try_from(header.entry_count).map_err(|_| cursor.corrupt("entry count overflow"))?;
    let mut entries = Vec::with_capacity(count.min(body.len()));
    for index in 0..count {
        let len = cursor.varint()?;
        let crc = cursor.crc()?;
        let bytes = cursor.take(len, "entry")?;
        if crc32fast::hash(bytes) != crc {
            return Err(LibraryError::CrcMismatch { index });
        }
        let record: SurrogateRecord = bincode::deserialize(bytes)?;
        entries.push(record);
    }
    if cursor.pos != body.len() {
        return Err(cursor.corrupt("trailing bytes after last entry"));
    }

    let library = AssetLibrary {
        folder: header.folder,
        name: header.name,
        ordinal: header.ordinal,
        next_identity: header.next_identity,
        entries,
    };
    library.validate()?;
    Ok(library)
}

fn check_preamble(data: &[u8]) -> LibraryResult<()> {
    if data.len() < 8 + CHECKSUM_LEN {
        return Err(LibraryError::Corrupt {
            offset: 0,
            reason: "shard data too short".into(),
        });
    }
    if &data[0..4] != MAGIC {
        return Err(LibraryError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into(),
            actual: String::from_utf8_lossy(&data[0..4]).into(),
        });
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&data[4..8]);
    let version = u32::from_be_bytes(version);
    if version != FORMAT_VERSION {
        return Err(LibraryError::UnsupportedVersion(version));
    }
    Ok(())
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn varint(&mut self) -> LibraryResult<usize> {
        let (value, consumed) = decode_varint(&self.data[self.pos..]).map_err(|_| self.corrupt("bad varint"))?;
        self.pos += consumed;
        usize::try_from(value).map_err(|_| self.corrupt("length overflow"))
    }

    fn crc(&mut self) -> LibraryResult<u32> {
        let bytes = self.take(4, "crc")?;
        let mut crc = [0u8; 4];
        crc.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(crc))
    }

    fn chunk(&mut self, what: &'static str) -> LibraryResult<&'a [u8]> {
        let len = self.varint()?;
        self.take(len, what)
    }

    fn take(&mut self, len: usize, what: &'static str) -> LibraryResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.corrupt(&format!("{what} extends beyond shard")))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn corrupt(&self, reason: &str) -> LibraryError {
        LibraryError::Corrupt {
            offset: self.pos as u64,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::encode_library;
    use rtsl_types::{
        Color, FieldValue, Identity, Primitive, SurrogateType, ValueSurrogate, Vector3,
    };

    fn sample() -> AssetLibrary {
        let mut lib = AssetLibrary::new("Scenes/Level1", "SceneAssetLibrary", 1, 1);
        lib.push(
            SurrogateRecord::new(
                Identity::compose(1, 1),
                SurrogateType::from_static("PersistentGameObject"),
            )
            .with_field("name", FieldValue::Primitive(Primitive::Str("Player".into())))
            .with_field("transform", FieldValue::Ref(Identity::compose(1, 2)))
            .with_field(
                "components",
                FieldValue::RefList(vec![Identity::compose(1, 2), Identity::compose(0, 4)]),
            ),
        )
        .unwrap();
        lib.push(
            SurrogateRecord::new(
                Identity::compose(1, 2),
                SurrogateType::from_static("PersistentTransform"),
            )
            .with_field(
                "local_position",
                FieldValue::Value(ValueSurrogate::Vector3(Vector3::new(1.0, 2.0, 3.0))),
            )
            .with_field("tint", FieldValue::Value(ValueSurrogate::Color(Color::WHITE))),
        )
        .unwrap();
        lib
    }

    #[test]
    fn decode_restores_library() {
        let lib = sample();
        let encoded = encode_library(&lib).unwrap();
        let decoded = decode_library(&encoded.data).unwrap();
        assert_eq!(decoded, lib);
        assert_eq!(decoded.next_identity, 3);
        assert_eq!(stored_checksum(&encoded.data), Some(encoded.handle().checksum));
    }

    #[test]
    fn empty_library_decodes() {
        let lib = AssetLibrary::new("F", "Empty", 0, 1);
        let encoded = encode_library(&lib).unwrap();
        let decoded = decode_library(&encoded.data).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.key(), "F/Empty");
    }

    #[test]
    fn bad_magic() {
        let mut data = encode_library(&sample()).unwrap().data;
        data[0..4].copy_from_slice(b"BADM");
        let err = decode_library(&data).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidMagic { .. }));
    }

    #[test]
    fn bad_version() {
        let mut data = encode_library(&sample()).unwrap().data;
        data[4..8].copy_from_slice(&99u32.to_be_bytes());
        let err = decode_library(&data).unwrap_err();
        assert!(matches!(err, LibraryError::UnsupportedVersion(99)));
    }

    #[test]
    fn too_short() {
        let err = decode_library(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, LibraryError::Corrupt { .. }));
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut data = encode_library(&sample()).unwrap().data;
        let mid = data.len() / 2;
        data[mid] ^= 0xFF;
        let err = decode_library(&data).unwrap_err();
        assert!(matches!(err, LibraryError::ChecksumMismatch { .. }));
    }

    #[test]
    fn entry_crc_is_checked_after_checksum() {
        let encoded = encode_library(&sample()).unwrap();
        let mut data = encoded.data[..encoded.data.len() - CHECKSUM_LEN].to_vec();
        // corrupt the last entry byte, then re-seal the trailer
        let last = data.len() - 1;
        data[last] ^= 0x01;
        let checksum = *blake3::hash(&data).as_bytes();
        data.extend_from_slice(&checksum);
        let err = decode_library(&data).unwrap_err();
        assert!(matches!(err, LibraryError::CrcMismatch { index: 1 }));
    }

    #[test]
    fn ordinal_survives_a_damaged_body() {
        let mut data = encode_library(&sample()).unwrap().data;
        let last = data.len() - CHECKSUM_LEN - 1;
        data[last] ^= 0xFF;
        assert!(decode_library(&data).is_err());
        assert_eq!(decode_ordinal(&data).unwrap(), 1);
        assert!(decode_ordinal(b"not a shard at all, not even close to one").is_err());
    }
}
