// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{BlockId, Error, Result};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size of one block on disk.
pub const BLOCK_SZ: usize = 4096;

/// Byte buffer holding exactly one block.
pub type BlockBuf = Box<[u8; BLOCK_SZ]>;

/// Allocates a zeroed block buffer.
#[must_use]
pub fn zeroed_block() -> BlockBuf {
    Box::new([0u8; BLOCK_SZ])
}

/// Keyed store of fixed-size blocks under 1-based integer keys.
///
/// Block `id` lives at byte offset `(id - 1) * BLOCK_SZ` of the backing
/// file, so the file length is always a multiple of [`BLOCK_SZ`].
pub struct BlockStore {
    path: PathBuf,
    file: File,
}

impl BlockStore {
    /// Creates a new store file.
    ///
    /// # Errors
    ///
    /// Fails with `StoreExists` if the file is already there.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => Error::StoreExists(path.to_path_buf()),
                _ => Error::Io(e),
            })?;
        debug!("created block store {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Opens an existing store file.
    ///
    /// # Errors
    ///
    /// Fails with `StoreMissing` if the file is absent, or with `Io` if its
    /// length is not block-aligned.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::StoreMissing(path.to_path_buf()),
                _ => Error::Io(e),
            })?;

        let len = file.metadata()?.len();
        if len % BLOCK_SZ as u64 != 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "store {} is not block-aligned ({len} bytes)",
                    path.display()
                ),
            )));
        }

        debug!("opened block store {} ({len} bytes)", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Number of blocks currently stored.
    pub fn record_count(&self) -> Result<u32> {
        let len = self.file.metadata()?.len();
        #[allow(clippy::cast_possible_truncation)]
        let count = (len / BLOCK_SZ as u64) as u32;
        Ok(count)
    }

    /// Reads the block stored under `id`.
    pub fn get(&mut self, id: BlockId) -> Result<BlockBuf> {
        debug_assert!(id > 0, "block ids are 1-based");

        let mut buf = zeroed_block();
        self.file.seek(SeekFrom::Start(block_offset(id)))?;
        self.file.read_exact(&mut buf[..])?;
        Ok(buf)
    }

    /// Writes `block` under `id`.
    pub fn put(&mut self, id: BlockId, block: &[u8; BLOCK_SZ]) -> Result<()> {
        debug_assert!(id > 0, "block ids are 1-based");

        self.file.seek(SeekFrom::Start(block_offset(id)))?;
        self.file.write_all(block)?;
        Ok(())
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the store file at `path`.
    ///
    /// # Errors
    ///
    /// Fails with `StoreMissing` if there is nothing to delete.
    pub fn remove(path: &Path) -> Result<()> {
        std::fs::remove_file(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::StoreMissing(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        debug!("removed block store {}", path.display());
        Ok(())
    }
}

fn block_offset(id: BlockId) -> u64 {
    u64::from(id - 1) * BLOCK_SZ as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn store_create_put_get() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("blocks.db");

        let mut store = BlockStore::create(&path)?;
        assert_eq!(store.record_count()?, 0);

        let mut block = zeroed_block();
        block[0] = 0xAB;
        block[BLOCK_SZ - 1] = 0xCD;
        store.put(1, &block)?;
        assert_eq!(store.record_count()?, 1);

        let read = store.get(1)?;
        assert_eq!(read[0], 0xAB);
        assert_eq!(read[BLOCK_SZ - 1], 0xCD);

        Ok(())
    }

    #[test]
    fn store_create_conflicts() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("blocks.db");

        BlockStore::create(&path)?;
        assert!(matches!(
            BlockStore::create(&path),
            Err(Error::StoreExists(_))
        ));

        Ok(())
    }

    #[test]
    fn store_open_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.db");

        assert!(matches!(
            BlockStore::open(&path),
            Err(Error::StoreMissing(_))
        ));
        assert!(matches!(
            BlockStore::remove(&path),
            Err(Error::StoreMissing(_))
        ));
    }

    #[test]
    fn store_survives_reopen() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("blocks.db");

        {
            let mut store = BlockStore::create(&path)?;
            let mut block = zeroed_block();
            block[7] = 7;
            store.put(1, &block)?;
            store.put(2, &zeroed_block())?;
        }

        let mut store = BlockStore::open(&path)?;
        assert_eq!(store.record_count()?, 2);
        assert_eq!(store.get(1)?[7], 7);

        BlockStore::remove(&path)?;
        assert!(matches!(
            BlockStore::open(&path),
            Err(Error::StoreMissing(_))
        ));

        Ok(())
    }
}
