//! Envelope encryption with a two-level key hierarchy.
//!
//! If you need to encrypt lots of data under one long-lived key, the healthy way to
//! do it is to *not* do it: generate a fresh, short-lived data-encryption key (DEK)
//! for each piece of data, encrypt the data with the DEK, and encrypt the DEK itself
//! under your long-lived key-encryption key (KEK).  The encrypted DEK travels
//! alongside the ciphertext, and the KEK never touches bulk data at all.  If a DEK
//! ever leaks, the damage stops at the one payload it protected.
//!
//! An [`EnvelopeBox`] does all of this.  Give it your KEK (a [`KeyHandle`], usually
//! read from wherever you keep secrets), and it will mint wrapped DEKs for you with
//! [`EnvelopeBox::create_dek`], and encrypt/decrypt payloads against those wrapped
//! DEKs with [`EnvelopeBox::encrypt`] and [`EnvelopeBox::decrypt`].  Both the wrapped
//! DEK blob and the ciphertext are opaque byte strings; store them, ship them, and
//! hand them back together when you want your data again.
//!
//! Everything is authenticated encryption (AES-GCM by default, ChaCha20-Poly1305 if
//! you prefer): a flipped bit anywhere in a blob or a ciphertext, or the wrong KEK,
//! or a mismatched blob/ciphertext pair, gets you a typed error, never garbage
//! plaintext.  The error tells you *which* layer refused -- [`Error::Unwrap`] for the
//! envelope, [`Error::Open`] for the payload -- so "wrong KEK or corrupted blob" is
//! distinguishable from "wrong DEK or corrupted ciphertext".
//!
//! Key material is treated as radioactive: handles keep their bytes in zeroize-on-drop
//! containers, cleartext DEKs exist only inside the single call that needs them, and
//! nothing about a key ever goes through `Debug` or a log line.
mod aead;
mod codec;
mod envelope;
mod error;
mod key;
mod wire;

pub use envelope::EnvelopeBox;
pub use error::Error;
pub use key::{Algorithm, KeyHandle};
