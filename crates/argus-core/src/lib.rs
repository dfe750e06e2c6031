//! argus-core: record codec, field registry, and result combiner.
//!
//! This crate defines the on-the-wire contract between argus ingestion
//! sources and lookup clients:
//!
//! - **Fields**: every attribute name is assigned a stable one-byte id via a
//!   shared [`FieldRegistry`] (at most 256 per process).
//! - **Codec**: `(field id, value)` pairs are packed into a TLV byte buffer
//!   ([`codec::encode`]) and unpacked for diagnostics ([`codec::decode`],
//!   [`codec::render`]).
//! - **Combiner**: per-source [`EncodedResult`]s for the same lookup key are
//!   merged into one [`CombinedResult`] ([`combine::combine`]).
//!
//! Layout mistakes here corrupt data silently for every downstream client,
//! so the size ceilings (255 entries per result, 250/240 value truncation)
//! are enforced with explicit errors rather than wrapping or clipping.

#![doc(html_root_url = "https://docs.rs/argus-core/0.1.0")]

pub mod codec;
pub mod combine;
mod error;
pub mod field;

pub use codec::{DecodedEntry, EncodedResult};
pub use combine::CombinedResult;
pub use error::{CoreError, Result};
pub use field::FieldRegistry;
