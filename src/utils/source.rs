//! Raw byte sources that can be opened at an arbitrary file offset.
//!
//! The indexing pass reads through either a plain file handle or a memory
//! map; positioned reads handed to callers always go through [`FileSource`].

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How the indexing pass reads the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    /// Chunked `read` calls on a file handle
    #[default]
    Buffered,
    /// Memory-mapped file
    Mmap,
}

/// A positioned, read-only view of a file's bytes
pub trait ByteSource: Send + Sync {
    /// Total length in bytes
    fn len(&self) -> io::Result<u64>;

    /// Open a reader positioned at `offset`
    fn open_at(&self, offset: u64) -> io::Result<Box<dyn Read + Send>>;
}

/// Opens a fresh file handle per reader
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    fn open_at(&self, offset: u64) -> io::Result<Box<dyn Read + Send>> {
        let mut file = File::open(&self.path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(Box::new(file))
    }
}

/// Shares one memory map between all readers
pub struct MmapSource {
    mmap: Arc<Mmap>,
}

impl MmapSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // Safety: the file must not be modified while indexed; the index is
        // only valid for an unchanged file anyway.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap: Arc::new(mmap),
        })
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> io::Result<u64> {
        Ok(self.mmap.len() as u64)
    }

    fn open_at(&self, offset: u64) -> io::Result<Box<dyn Read + Send>> {
        let pos = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds address space"))?
            .min(self.mmap.len());
        let reader = MmapReader {
            mmap: Arc::clone(&self.mmap),
            pos,
        };
        Ok(Box::new(reader))
    }
}

struct MmapReader {
    mmap: Arc<Mmap>,
    pos: usize,
}

impl Read for MmapReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Open the source the indexing pass should read through
pub fn open_source(path: &Path, strategy: ReadStrategy) -> io::Result<Box<dyn ByteSource>> {
    match strategy {
        ReadStrategy::Buffered => Ok(Box::new(FileSource::new(path))),
        ReadStrategy::Mmap => {
            // Mapping an empty file fails on some platforms
            if std::fs::metadata(path)?.len() == 0 {
                Ok(Box::new(FileSource::new(path)))
            } else {
                Ok(Box::new(MmapSource::open(path)?))
            }
        }
    }
}
