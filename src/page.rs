// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A block interpreted as a slot directory plus a downward-growing record
//! heap.
//!
//! Layout, with 2-byte little-endian integers throughout:
//!
//! ```text
//! 0x0000  num_records      (u16)
//! 0x0002  end_free         (u16, offset of last used byte of record area)
//! 0x0004  size_1, loc_1    (u16, u16)   slot 1
//! 0x0008  size_2, loc_2    (u16, u16)   slot 2
//! ...
//! [free space]
//! end_free+1 .. BLOCK_SZ-1 record payloads, packed from the high end down
//! ```
//!
//! Slot `i` lives at offset `4 * i`, so slot 0 overlaps the page header.
//! `loc == 0` marks a tombstoned slot. Record ids are handed out 1, 2, ...
//! and are never reused within a page, even after deletion.

use crate::store::{BlockBuf, BLOCK_SZ};
use crate::{BlockId, RecordId};
use log::trace;

/// Returned by page operations when the free region cannot take the payload.
///
/// Deliberately not a [`crate::Error`]: the relation layer reacts to this by
/// allocating a new page and must not confuse it with an I/O failure.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NoRoom;

/// Places, retrieves, resizes and deletes variable-length records inside
/// one fixed-size block.
pub struct SlottedPage {
    block_id: BlockId,
    buf: BlockBuf,
    num_records: u16,
    end_free: u16,
}

impl SlottedPage {
    /// Interprets `buf` as a slotted page.
    ///
    /// With `is_new` the header is initialized (empty page); otherwise the
    /// header fields are read out of the buffer.
    #[must_use]
    pub fn new(block_id: BlockId, buf: BlockBuf, is_new: bool) -> Self {
        const LAST_BYTE: u16 = (BLOCK_SZ - 1) as u16;

        let mut page = Self {
            block_id,
            buf,
            num_records: 0,
            end_free: LAST_BYTE,
        };
        if is_new {
            page.write_header();
        } else {
            // slot 0 overlaps the page header
            let (num_records, end_free) = page.read_slot(0);
            page.num_records = num_records;
            page.end_free = end_free;
        }
        page
    }

    /// The id of the block this page lives in.
    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// The raw block bytes, for writing the page back to its store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; BLOCK_SZ] {
        &self.buf
    }

    /// Adds a new record, returning its id. Ids strictly increase.
    ///
    /// # Errors
    ///
    /// Fails with [`NoRoom`] when one new slot header plus the payload do
    /// not fit into the free region.
    pub fn add(&mut self, data: &[u8]) -> Result<RecordId, NoRoom> {
        let size = u16::try_from(data.len()).map_err(|_| NoRoom)?;
        if !self.has_room(size) {
            return Err(NoRoom);
        }

        self.num_records += 1;
        let id = self.num_records;
        self.end_free -= size;
        let loc = self.end_free + 1;
        self.write_header();
        self.write_slot(id, size, loc);
        self.buf[usize::from(loc)..usize::from(loc) + usize::from(size)].copy_from_slice(data);

        trace!(
            "block {}: added record {id}, {size} bytes at {loc}",
            self.block_id
        );
        Ok(id)
    }

    /// The payload of record `id`, or `None` for tombstoned or never
    /// allocated ids.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&[u8]> {
        if id == 0 || id > self.num_records {
            return None;
        }
        let (size, loc) = self.read_slot(id);
        if loc == 0 {
            return None;
        }
        Some(&self.buf[usize::from(loc)..usize::from(loc) + usize::from(size)])
    }

    /// Replaces the payload of record `id`, sliding neighbors as needed.
    ///
    /// # Errors
    ///
    /// Fails with [`NoRoom`] when growing and the extra bytes do not fit.
    pub fn put(&mut self, id: RecordId, data: &[u8]) -> Result<(), NoRoom> {
        let (size, loc) = self.read_slot(id);
        let new_size = u16::try_from(data.len()).map_err(|_| NoRoom)?;

        if new_size > size {
            let extra = new_size - size;
            if !self.has_room(extra) {
                return Err(NoRoom);
            }
            self.slide(loc, loc - extra);
            let start = usize::from(loc - extra);
            self.buf[start..start + usize::from(new_size)].copy_from_slice(data);
        } else {
            self.buf[usize::from(loc)..usize::from(loc) + usize::from(new_size)]
                .copy_from_slice(data);
            self.slide(loc + new_size, loc + size);
        }

        // the slide may have moved this record's payload
        let (_, loc) = self.read_slot(id);
        self.write_slot(id, new_size, loc);
        Ok(())
    }

    /// Tombstones record `id` and reclaims its payload bytes.
    ///
    /// The id stays burned: `num_records` is not decremented and the id is
    /// never handed out again.
    pub fn del(&mut self, id: RecordId) {
        let (size, loc) = self.read_slot(id);
        self.write_slot(id, 0, 0);
        self.slide(loc, loc + size);
    }

    /// Ascending list of non-tombstoned record ids.
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        (1..=self.num_records)
            .filter(|&id| self.read_slot(id).1 != 0)
            .collect()
    }

    /// One new slot header plus `size` payload bytes must fit between the
    /// slot directory and `end_free`.
    fn has_room(&self, size: u16) -> bool {
        4 * (u32::from(self.num_records) + 1) + u32::from(size) <= u32::from(self.end_free)
    }

    /// Moves the packed payload region so the byte at `start` lands at
    /// `end`, then fixes up every live slot at or below `start` and
    /// adjusts `end_free`.
    ///
    /// A negative shift (`end < start`) opens space, a positive shift
    /// closes it. This is the single invariant-preserving primitive both
    /// growth and shrink go through.
    fn slide(&mut self, start: u16, end: u16) {
        let shift = i32::from(end) - i32::from(start);
        if shift == 0 {
            return;
        }

        let data_start = usize::from(self.end_free) + 1;
        #[allow(clippy::cast_sign_loss)]
        let dest = (data_start as i32 + shift) as usize;
        self.buf.copy_within(data_start..usize::from(start), dest);

        for id in self.ids() {
            let (size, loc) = self.read_slot(id);
            if loc <= start {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                self.write_slot(id, size, (i32::from(loc) + shift) as u16);
            }
        }

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        {
            self.end_free = (i32::from(self.end_free) + shift) as u16;
        }
        self.write_header();
    }

    fn write_header(&mut self) {
        let (num_records, end_free) = (self.num_records, self.end_free);
        self.write_slot(0, num_records, end_free);
    }

    fn read_slot(&self, id: RecordId) -> (u16, u16) {
        (self.read_u16(4 * id), self.read_u16(4 * id + 2))
    }

    fn write_slot(&mut self, id: RecordId, size: u16, loc: u16) {
        self.write_u16(4 * id, size);
        self.write_u16(4 * id + 2, loc);
    }

    fn read_u16(&self, offset: u16) -> u16 {
        let offset = usize::from(offset);
        u16::from_le_bytes([self.buf[offset], self.buf[offset + 1]])
    }

    fn write_u16(&mut self, offset: u16, n: u16) {
        let offset = usize::from(offset);
        self.buf[offset..offset + 2].copy_from_slice(&n.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::zeroed_block;
    use test_log::test;

    fn fresh() -> SlottedPage {
        SlottedPage::new(1, zeroed_block(), true)
    }

    #[test]
    fn page_add_get_put_del() {
        let mut page = fresh();

        let id = page.add(b"hello\0").expect("has room");
        assert_eq!(id, 1);
        assert_eq!(page.get(1), Some(&b"hello\0"[..]));

        let id = page.add(b"goodbye\0").expect("has room");
        assert_eq!(id, 2);
        assert_eq!(page.get(2), Some(&b"goodbye\0"[..]));

        // expanding put slides record 2 out of the way
        page.put(1, b"something much bigger\0").expect("has room");
        assert_eq!(page.get(2), Some(&b"goodbye\0"[..]));
        assert_eq!(page.get(1), Some(&b"something much bigger\0"[..]));

        // contracting put closes the gap again
        page.put(1, b"hello\0").expect("has room");
        assert_eq!(page.get(2), Some(&b"goodbye\0"[..]));
        assert_eq!(page.get(1), Some(&b"hello\0"[..]));

        assert_eq!(page.ids(), vec![1, 2]);
        page.del(1);
        assert_eq!(page.ids(), vec![2]);
        assert_eq!(page.get(1), None);
        assert_eq!(page.get(2), Some(&b"goodbye\0"[..]));
    }

    #[test]
    fn page_add_without_room() {
        let mut page = fresh();
        page.add(b"hello\0").expect("has room");

        // too big, but only because there is already a record in there
        let huge = vec![0u8; BLOCK_SZ - 10];
        assert_eq!(page.add(&huge), Err(NoRoom));

        // the failed add must not have changed anything
        assert_eq!(page.ids(), vec![1]);
        assert_eq!(page.get(1), Some(&b"hello\0"[..]));
    }

    #[test]
    fn page_ids_increase_and_are_never_reused() {
        let mut page = fresh();
        let a = page.add(b"a").expect("has room");
        let b = page.add(b"bb").expect("has room");
        let c = page.add(b"ccc").expect("has room");
        assert!(a < b && b < c);

        page.del(b);
        let d = page.add(b"dddd").expect("has room");
        assert!(d > c);
        assert_eq!(page.ids(), vec![a, c, d]);
    }

    #[test]
    fn page_survives_header_round_trip() {
        let mut page = fresh();
        page.add(b"four score").expect("has room");
        page.add(b"and seven").expect("has room");
        page.del(1);

        // re-read the page from its raw bytes, as a fetch would
        let page = SlottedPage::new(1, Box::new(*page.as_bytes()), false);
        assert_eq!(page.ids(), vec![2]);
        assert_eq!(page.get(2), Some(&b"and seven"[..]));
    }

    #[test]
    fn page_get_out_of_range() {
        let page = fresh();
        assert_eq!(page.get(0), None);
        assert_eq!(page.get(1), None);
        assert_eq!(page.get(u16::MAX), None);
    }

    #[test]
    fn page_fills_up_exactly() {
        let mut page = fresh();

        // keep adding 96-byte records until the page refuses
        let rec = [7u8; 96];
        let mut count = 0u32;
        while page.add(&rec).is_ok() {
            count += 1;
        }
        // 4 bytes of slot header per record plus payload
        assert_eq!(count, (BLOCK_SZ as u32 - 5) / 100);

        for id in page.ids() {
            assert_eq!(page.get(id), Some(&rec[..]));
        }
    }

    /// Random add/put/del torture against a model map; checks round-trips
    /// and that live payload ranges never overlap.
    #[test]
    fn page_torture() {
        use rand::prelude::*;

        let mut rng = rand::rng();
        let mut page = fresh();
        let mut model: Vec<(RecordId, Vec<u8>)> = Vec::new();

        for round in 0u32..2_000 {
            match rng.random_range(0..3) {
                0 => {
                    let len = rng.random_range(0..200);
                    let data: Vec<u8> = (0..len).map(|_| rng.random()).collect();
                    if let Ok(id) = page.add(&data) {
                        model.push((id, data));
                    }
                }
                1 if !model.is_empty() => {
                    let slot = rng.random_range(0..model.len());
                    let len = rng.random_range(0..200);
                    let data: Vec<u8> = (0..len).map(|_| rng.random()).collect();
                    let (id, payload) = &mut model[slot];
                    if page.put(*id, &data).is_ok() {
                        *payload = data;
                    }
                }
                _ if !model.is_empty() => {
                    let slot = rng.random_range(0..model.len());
                    let (id, _) = model.remove(slot);
                    page.del(id);
                }
                _ => {}
            }

            for (id, payload) in &model {
                assert_eq!(page.get(*id), Some(&payload[..]), "round {round}");
            }

            let mut ranges: Vec<(u16, u16)> = model
                .iter()
                .map(|(id, payload)| {
                    let data = page.get(*id).expect("live record");
                    let loc = data.as_ptr() as usize - page.as_bytes().as_ptr() as usize;
                    #[allow(clippy::cast_possible_truncation)]
                    let range = (loc as u16, payload.len() as u16);
                    range
                })
                .collect();
            ranges.sort_unstable();
            for pair in ranges.windows(2) {
                assert!(
                    pair[0].0 + pair[0].1 <= pair[1].0,
                    "overlapping payloads in round {round}"
                );
            }
        }
    }
}
