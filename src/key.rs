use secrecy::{ExposeSecret as _, SecretSlice};
use zeroize::Zeroizing;

use super::{Error, wire};

// Reads as "envK" in base64
const KEY_HANDLE_MAGIC: [u8; 3] = [0x7a, 0x7b, 0xca];

/// The AEAD algorithm a [`KeyHandle`]'s material is intended for.
///
/// Data-encryption keys are always generated for [`Algorithm::Aes128Gcm`]; the other
/// algorithms are recognized so that an externally-supplied key-encryption key may use
/// them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Algorithm {
	Aes128Gcm,
	Aes256Gcm,
	ChaCha20Poly1305,
}

impl Algorithm {
	/// The length, in bytes, of key material for this algorithm.
	pub fn key_length(self) -> usize {
		match self {
			Self::Aes128Gcm => 16,
			Self::Aes256Gcm | Self::ChaCha20Poly1305 => 32,
		}
	}

	// Wire IDs are stable; do not renumber
	fn id(self) -> u64 {
		match self {
			Self::Aes128Gcm => 1,
			Self::Aes256Gcm => 2,
			Self::ChaCha20Poly1305 => 3,
		}
	}

	fn from_id(id: u64) -> Option<Self> {
		match id {
			1 => Some(Self::Aes128Gcm),
			2 => Some(Self::Aes256Gcm),
			3 => Some(Self::ChaCha20Poly1305),
			_ => None,
		}
	}
}

/// The fixed template used for every freshly-generated data-encryption key.
pub(crate) const DEK_ALGORITHM: Algorithm = Algorithm::Aes128Gcm;

/// Generate a fresh data-encryption key.
///
/// Every call produces statistically independent key material; nothing is cached or
/// reused between calls.
#[tracing::instrument(level = "debug")]
pub(crate) fn generate_dek() -> Result<KeyHandle, Error> {
	KeyHandle::generate(DEK_ALGORITHM)
}

/// A symmetric key plus the algorithm it belongs to.
///
/// The raw key material is never handed out; it lives in a [`secrecy::SecretSlice`],
/// which zeroizes it on drop, and the only way it leaves process memory is inside the
/// AEAD-sealed encoding produced by wrapping the handle under another key.
#[derive(Debug)]
pub struct KeyHandle {
	algorithm: Algorithm,
	material: SecretSlice<u8>,
}

impl KeyHandle {
	/// Generate a fresh key for the given algorithm, straight from the operating
	/// system's RNG.
	///
	/// This is how you mint a key-encryption key if you don't already have one stored
	/// somewhere out of the way.
	///
	/// # Errors
	///
	/// Returns [`Error::Generation`] if the OS RNG refuses to produce random bytes.
	#[tracing::instrument(level = "debug")]
	pub fn generate(algorithm: Algorithm) -> Result<Self, Error> {
		use rand::TryRngCore as _;

		let mut material = Zeroizing::new(vec![0u8; algorithm.key_length()]);

		rand::rngs::OsRng
			.try_fill_bytes(&mut material)
			.map_err(|_| Error::Generation)?;

		Ok(Self {
			algorithm,
			material: material.to_vec().into(),
		})
	}

	/// Which algorithm this key belongs to.
	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	pub(crate) fn expose_secret(&self) -> &[u8] {
		self.material.expose_secret()
	}

	/// Import a key handle from its cleartext encoding.
	///
	/// "Cleartext" is in the name because the input contains raw key material; only
	/// feed this bytes that arrived through a channel you trust (a secrets store, a
	/// KMS response, a file with sane permissions).
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidKey`] or a decoding error if the bytes are not a valid
	/// key handle encoding.
	pub fn from_cleartext(b: &[u8]) -> Result<Self, Error> {
		Self::decode(b)
	}

	/// Read a cleartext-encoded key handle from an external source.
	///
	/// This is the boundary where a key-encryption key enters the process.
	///
	/// # Errors
	///
	/// Returns [`Error::KekUnavailable`] if the source cannot be read, or the same
	/// errors as [`KeyHandle::from_cleartext`] if it can be read but not parsed.
	#[tracing::instrument(level = "debug", skip(reader))]
	pub fn from_cleartext_reader(mut reader: impl std::io::Read) -> Result<Self, Error> {
		let mut bytes = Zeroizing::new(Vec::new());

		reader
			.read_to_end(&mut bytes)
			.map_err(Error::kek_unavailable)?;

		Self::decode(&bytes)
	}

	/// Export this key handle in its cleartext encoding.
	///
	/// The output contains raw key material.  Treat it accordingly.
	///
	/// # Errors
	///
	/// Returns [`Error::Encoding`] in the (extremely unlikely) event serialization
	/// fails.
	pub fn to_cleartext(&self) -> Result<Vec<u8>, Error> {
		Ok(self.encode()?.to_vec())
	}

	pub(crate) fn encode(&self) -> Result<Zeroizing<Vec<u8>>, Error> {
		use ciborium_ll::{Encoder, Header};

		let mut v = Zeroizing::new(Vec::new());

		v.extend_from_slice(&KEY_HANDLE_MAGIC);

		let mut enc = Encoder::from(&mut *v);
		enc.push(Header::Array(Some(2)))
			.map_err(|e| Error::encoding("key handle", e))?;
		enc.push(Header::Positive(self.algorithm.id()))
			.map_err(|e| Error::encoding("algorithm", e))?;
		enc.bytes(self.material.expose_secret(), None)
			.map_err(|e| Error::encoding("key material", e))?;

		Ok(v)
	}

	pub(crate) fn decode(b: &[u8]) -> Result<Self, Error> {
		use ciborium_ll::Decoder;

		if b.len() < KEY_HANDLE_MAGIC.len() + 2 {
			return Err(Error::invalid_key("too short"));
		}

		if b[0..3] != KEY_HANDLE_MAGIC {
			return Err(Error::invalid_key("incorrect magic"));
		}

		let mut dec = Decoder::from(&b[3..]);

		wire::pull_array(&mut dec, 2, "key handle")?;

		let algorithm = Algorithm::from_id(wire::pull_positive(&mut dec, "algorithm")?)
			.ok_or_else(|| Error::invalid_key("unrecognized algorithm"))?;

		let material = Zeroizing::new(wire::pull_bytes(&mut dec, "key material")?);

		if material.len() != algorithm.key_length() {
			return Err(Error::invalid_key(
				"key material length does not match algorithm",
			));
		}

		Ok(Self {
			algorithm,
			material: material.to_vec().into(),
		})
	}
}

impl Clone for KeyHandle {
	fn clone(&self) -> Self {
		Self {
			algorithm: self.algorithm,
			material: self.material.expose_secret().to_vec().into(),
		}
	}
}
