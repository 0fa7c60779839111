// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Heap-organized table storage: a relation is a bag of rows marshalled
//! into slotted pages, which live in a block-store-backed heap file.

pub mod codec;
pub mod file;
pub mod relation;
