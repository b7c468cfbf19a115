//! Data types exchanged between handlers and the storage service.
//!
//! Nothing here is persisted except through the archive files themselves.

pub mod archive;
pub mod landing;
pub mod upload;
