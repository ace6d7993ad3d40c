//! Shadebox - encrypted image containers and a viewer core
//!
//! Images are protected at rest as opaque authenticated `.enc` containers
//! sealed with NaCl secretbox (XSalsa20Poly1305) under a 256-bit random
//! key stored as a base64url `.key` file. Decrypted pixels only ever live
//! in memory; the viewer core fits them into a viewport and walks a list
//! of containers without touching persistent storage.

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod file_ops;
pub mod keystore;
pub mod navigator;
pub mod raster;
pub mod viewport;
