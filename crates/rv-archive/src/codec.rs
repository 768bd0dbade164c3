//! tar.gz container encoding and decoding.
//!
//! Encoding is lazy: [`encode`] returns a stream that reads one blob at a
//! time from the file store, appends it to a tar builder writing through a
//! gzip encoder into a shared buffer, and yields the buffer whenever it holds
//! at least `chunk_size` bytes. Dropping the stream early leaves nothing
//! behind.
//!
//! Decoding reads the whole archive into [`ArchiveContents`], separating
//! root-level `*.json` manifests from payload entries.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use futures_util::stream::{self, BoxStream, StreamExt};
use rv_config::ArchiveConfig;
use rv_files::FileStore;
use serde::Serialize;

use crate::error::ArchiveError;

/// Gzip-compressed tar bytes, in chunks.
pub type ArchiveStream = BoxStream<'static, Result<Vec<u8>, ArchiveError>>;

/// Where the bytes of an archive entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    Inline(Vec<u8>),
    /// Content key in the file store, read when the entry is written.
    Blob(String),
}

/// An entry queued for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub path: String,
    pub source: EntrySource,
}

impl PlannedEntry {
    pub fn json(path: String, value: &impl Serialize) -> Result<Self, ArchiveError> {
        Ok(Self {
            path,
            source: EntrySource::Inline(serde_json::to_vec_pretty(value)?),
        })
    }

    #[must_use]
    pub fn blob(path: String, key: &str) -> Self {
        Self {
            path,
            source: EntrySource::Blob(key.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Write target shared between the tar builder and the stream.
#[derive(Clone, Default)]
struct ChunkBuffer(Arc<Mutex<Vec<u8>>>);

impl ChunkBuffer {
    fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Write for ChunkBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Encoder {
    entries: std::vec::IntoIter<PlannedEntry>,
    builder: Option<tar::Builder<GzEncoder<ChunkBuffer>>>,
    buffer: ChunkBuffer,
    files: FileStore,
    chunk_size: usize,
    mtime: u64,
}

impl Encoder {
    async fn next_chunk(mut self) -> Result<Option<(Vec<u8>, Self)>, ArchiveError> {
        loop {
            if self.buffer.len() >= self.chunk_size {
                let chunk = self.buffer.take();
                return Ok(Some((chunk, self)));
            }
            if let Some(entry) = self.entries.next() {
                self.append(entry).await?;
                continue;
            }
            if let Some(builder) = self.builder.take() {
                builder.into_inner()?.finish()?;
                continue;
            }
            let rest = self.buffer.take();
            return Ok(if rest.is_empty() {
                None
            } else {
                Some((rest, self))
            });
        }
    }

    async fn append(&mut self, entry: PlannedEntry) -> Result<(), ArchiveError> {
        let data = match entry.source {
            EntrySource::Inline(bytes) => bytes,
            EntrySource::Blob(key) => self.files.read(&key).await?,
        };
        let builder = self
            .builder
            .as_mut()
            .ok_or_else(|| io::Error::other("archive already finished"))?;

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);
        header.set_size(data.len() as u64);
        builder.append_data(&mut header, &entry.path, data.as_slice())?;
        tracing::debug!(path = %entry.path, size = data.len(), "wrote archive entry");
        Ok(())
    }
}

/// Stream `entries` as a gzip-compressed tar archive.
#[must_use]
pub fn encode(entries: Vec<PlannedEntry>, files: FileStore, config: &ArchiveConfig) -> ArchiveStream {
    let buffer = ChunkBuffer::default();
    let gz = GzEncoder::new(buffer.clone(), Compression::new(config.compression_level));
    let encoder = Encoder {
        entries: entries.into_iter(),
        builder: Some(tar::Builder::new(gz)),
        buffer,
        files,
        chunk_size: config.chunk_size.max(1),
        mtime: u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0),
    };
    stream::try_unfold(encoder, Encoder::next_chunk).boxed()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decoded archive: manifests in archive order, payloads by path.
#[derive(Debug, Default)]
pub struct ArchiveContents {
    manifests: Vec<(String, Vec<u8>)>,
    files: HashMap<String, Vec<u8>>,
}

impl ArchiveContents {
    #[must_use]
    pub fn manifests(&self) -> &[(String, Vec<u8>)] {
        &self.manifests
    }

    /// Payload stored at `path`.
    pub fn file(&self, path: &str) -> Result<&[u8], ArchiveError> {
        self.files
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| ArchiveError::Corrupt(format!("missing archive entry {path}")))
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

fn is_manifest_path(path: &str) -> bool {
    !path.contains('/') && path.ends_with(".json")
}

/// Read a gzip-compressed tar archive.
///
/// Non-regular entries are skipped. Entries larger than `max_entry_bytes`
/// are rejected.
pub fn decode(reader: impl Read, max_entry_bytes: u64) -> Result<ArchiveContents, ArchiveError> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut contents = ArchiveContents::default();

    for entry in archive.entries().map_err(ArchiveError::corrupt)? {
        let mut entry = entry.map_err(ArchiveError::corrupt)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(ArchiveError::corrupt)?
            .to_string_lossy()
            .trim_start_matches("./")
            .to_string();
        let size = entry.header().size().map_err(ArchiveError::corrupt)?;
        if size > max_entry_bytes {
            return Err(ArchiveError::Corrupt(format!(
                "entry {path} is {size} bytes, limit is {max_entry_bytes}"
            )));
        }

        let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        entry
            .read_to_end(&mut data)
            .map_err(ArchiveError::corrupt)?;
        tracing::debug!(%path, size, "read archive entry");

        if is_manifest_path(&path) {
            contents.manifests.push((path, data));
        } else {
            contents.files.insert(path, data);
        }
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn small_chunks() -> ArchiveConfig {
        ArchiveConfig {
            chunk_size: 16,
            ..ArchiveConfig::default()
        }
    }

    #[tokio::test]
    async fn encode_then_decode() {
        let files = FileStore::in_memory();
        let stored = files.store("shot.png", b"png bytes").await.unwrap();
        let entries = vec![
            PlannedEntry::json("prj-1.json".into(), &json!({"format": "projects/v1"})).unwrap(),
            PlannedEntry::blob("prj-1-images/shot.png".into(), &stored.key),
        ];

        let chunks: Vec<Vec<u8>> = encode(entries, files, &small_chunks())
            .try_collect()
            .await
            .unwrap();
        assert!(chunks.len() > 1);

        let bytes = chunks.concat();
        let contents = decode(bytes.as_slice(), 1024).unwrap();
        assert_eq!(contents.manifests().len(), 1);
        assert_eq!(contents.manifests()[0].0, "prj-1.json");
        assert_eq!(contents.file("prj-1-images/shot.png").unwrap(), b"png bytes");
        assert_eq!(contents.file_count(), 1);
    }

    #[tokio::test]
    async fn missing_blob_fails_the_stream() {
        let entries = vec![PlannedEntry::blob(
            "x-images/a.png".into(),
            &rv_files::content_key(b"never stored"),
        )];
        let result: Result<Vec<Vec<u8>>, _> =
            encode(entries, FileStore::in_memory(), &ArchiveConfig::default())
                .try_collect()
                .await;
        assert!(matches!(
            result,
            Err(ArchiveError::Files(rv_files::StoreError::MissingBlob { .. }))
        ));
    }

    #[tokio::test]
    async fn oversized_entry_is_rejected() {
        let entries = vec![PlannedEntry {
            path: "big.json".into(),
            source: EntrySource::Inline(vec![b' '; 100]),
        }];
        let bytes: Vec<u8> = encode(entries, FileStore::in_memory(), &ArchiveConfig::default())
            .try_concat()
            .await
            .unwrap();
        assert!(matches!(
            decode(bytes.as_slice(), 10),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(
            decode(&b"definitely not gzip"[..], 1024),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn manifest_paths_are_root_json_files() {
        assert!(is_manifest_path("tpl-1.json"));
        assert!(!is_manifest_path("prj-1-images/data.json"));
        assert!(!is_manifest_path("prj-1-images/a.png"));
    }

    #[tokio::test]
    async fn dropping_the_stream_early_is_harmless() {
        let files = FileStore::in_memory();
        let stored = files.store("a.bin", &[7u8; 4096]).await.unwrap();
        let entries = (0..10)
            .map(|i| PlannedEntry::blob(format!("p-images/{i}.bin"), &stored.key))
            .collect();
        let mut stream = encode(entries, files.clone(), &small_chunks());
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        drop(stream);
        assert!(files.exists(&stored.key).await.unwrap());
    }
}
