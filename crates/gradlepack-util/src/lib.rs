#![forbid(unsafe_code)]
//! Hashing, filesystem, properties, and download helpers for gradlepack.

pub mod archive;
pub mod download;
pub mod error;
pub mod fs;
pub mod hash;
pub mod properties;
