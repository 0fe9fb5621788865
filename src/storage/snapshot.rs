use std::path::Path;
use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::tables::Tables;

/// On-disk image of the tables, rewritten on every committed write.
///
/// Layout: `crc32 (u32 LE) ‖ lz4(bincode(Snapshot))`, checksum over the
/// compressed payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub saved_at: DateTime<Utc>,
    pub tables: Tables,
}

impl Snapshot {
    pub fn new(tables: Tables) -> Self {
        Snapshot {
            saved_at: Utc::now(),
            tables,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let raw = bincode::serialize(self)?;
        let payload = lz4_flex::compress_prepend_size(&raw);

        let mut hasher = Hasher::new();
        hasher.update(&payload);

        let mut bytes = Vec::with_capacity(payload.len() + 4);
        bytes.extend_from_slice(&hasher.finalize().to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(Error::new(ErrorKind::Parse, "Snapshot file truncated".to_string()));
        }

        let (checksum, payload) = bytes.split_at(4);
        let expected = u32::from_le_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]);

        let mut hasher = Hasher::new();
        hasher.update(payload);
        if hasher.finalize() != expected {
            return Err(Error::new(ErrorKind::Parse, "Snapshot checksum mismatch".to_string()));
        }

        let raw = lz4_flex::decompress_size_prepended(payload)?;
        Ok(bincode::deserialize(&raw)?)
    }

    /// Loads the snapshot at `path`, `None` when no file exists yet.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(Self::decode(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes through a temp file and renames it into place.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = self.encode()?;
        let tmp = path.with_extension("idx.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
