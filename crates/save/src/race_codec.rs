// ---------------------------------------------------------------------------
// race_codec – StoredRace <-> file bytes
// ---------------------------------------------------------------------------
//
// On save: bitcode encode -> lz4 compress -> prepend header
// On load: validate header -> lz4 decompress -> check size -> bitcode decode

use crate::file_header::{unwrap_header, wrap_with_header, FLAG_COMPRESSED};
use crate::race_record::{StoredRace, RACE_SCHEMA_VERSION};
use crate::store_error::StoreError;

pub fn encode_race(race: &StoredRace) -> Vec<u8> {
    let encoded = bitcode::encode(race);
    let compressed = lz4_flex::compress_prepend_size(&encoded);
    wrap_with_header(
        &compressed,
        FLAG_COMPRESSED,
        race.created_at_ms,
        encoded.len(),
        RACE_SCHEMA_VERSION,
    )
}

pub fn decode_race(bytes: &[u8]) -> Result<StoredRace, StoreError> {
    let (header, payload) = unwrap_header(bytes)?;
    if header.schema_version > RACE_SCHEMA_VERSION {
        return Err(StoreError::VersionMismatch {
            expected_max: RACE_SCHEMA_VERSION,
            found: header.schema_version,
        });
    }

    let raw = if header.is_compressed() {
        // The checksum covers the prefix too, but not whether it is sane, so
        // it must agree with the header before anything is allocated.
        let (prefix, block) = payload
            .split_first_chunk::<4>()
            .ok_or_else(|| StoreError::Corrupt("compressed payload too short".into()))?;
        let prefixed = u32::from_le_bytes(*prefix);
        if prefixed != header.uncompressed_size {
            return Err(StoreError::Corrupt(format!(
                "lz4 size prefix is {prefixed}, header says {}",
                header.uncompressed_size
            )));
        }
        lz4_flex::block::decompress(block, prefixed as usize)
            .map_err(|e| StoreError::Corrupt(format!("lz4: {e}")))?
    } else {
        payload.to_vec()
    };
    if raw.len() != header.uncompressed_size as usize {
        return Err(StoreError::Corrupt(format!(
            "payload is {} bytes, header says {}",
            raw.len(),
            header.uncompressed_size
        )));
    }

    Ok(bitcode::decode(&raw)?)
}
