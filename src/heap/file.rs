// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::page::SlottedPage;
use crate::store::{zeroed_block, BlockStore};
use crate::{BlockId, Error, Result};
use log::trace;
use std::path::{Path, PathBuf};

/// An ordered sequence of slotted pages backed by one block store file.
///
/// Block ids are 1-based and dense; creation forces one empty page to
/// exist, so an existing file always has block 1.
pub struct HeapFile {
    path: PathBuf,
    store: Option<BlockStore>,
    last: BlockId,
}

impl HeapFile {
    /// A handle for `<name>.db` inside `dir`. No I/O happens until
    /// [`HeapFile::create`] or [`HeapFile::open`].
    #[must_use]
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.db")),
            store: None,
            last: 0,
        }
    }

    /// Creates the underlying store and forces one empty page to exist.
    ///
    /// # Errors
    ///
    /// Fails with `StoreExists` when the file is already there.
    pub fn create(&mut self) -> Result<()> {
        self.store = Some(BlockStore::create(&self.path)?);
        self.last = 0;
        self.get_new()?;
        Ok(())
    }

    /// Opens the underlying store. No-op when already open.
    ///
    /// # Errors
    ///
    /// Fails with `StoreMissing` when the file does not exist.
    pub fn open(&mut self) -> Result<()> {
        if self.store.is_some() {
            return Ok(());
        }
        let store = BlockStore::open(&self.path)?;
        self.last = store.record_count()?;
        self.store = Some(store);
        Ok(())
    }

    /// Closes the store. Idempotent.
    pub fn close(&mut self) {
        self.store = None;
    }

    /// Closes the store and removes the backing file. The heap file is not
    /// reusable afterwards.
    pub fn delete(&mut self) -> Result<()> {
        self.close();
        BlockStore::remove(&self.path)
    }

    /// Allocates a fresh page at the end of the file.
    pub fn get_new(&mut self) -> Result<SlottedPage> {
        self.open()?;
        self.last += 1;
        let id = self.last;

        // Write the initialized block out, then read it back, so the page
        // handed out reflects exactly what the store holds.
        let page = SlottedPage::new(id, zeroed_block(), true);
        let store = self.store_mut()?;
        store.put(id, page.as_bytes())?;
        let buf = store.get(id)?;

        trace!("allocated block {id} in {}", self.path.display());
        Ok(SlottedPage::new(id, buf, false))
    }

    /// Fetches the page stored under `block_id`.
    pub fn get(&mut self, block_id: BlockId) -> Result<SlottedPage> {
        self.open()?;
        let buf = self.store_mut()?.get(block_id)?;
        Ok(SlottedPage::new(block_id, buf, false))
    }

    /// Writes a page back under its block id.
    pub fn put(&mut self, page: &SlottedPage) -> Result<()> {
        self.store_mut()?.put(page.block_id(), page.as_bytes())
    }

    /// All block ids, in order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        1..=self.last
    }

    /// Highest block id ever allocated.
    #[must_use]
    pub fn last(&self) -> BlockId {
        self.last
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_mut(&mut self) -> Result<&mut BlockStore> {
        self.store.as_mut().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "heap file is not open",
            ))
        })
    }
}
