use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::{
	ChaCha20Poly1305,
	aead::{Aead as _, KeyInit as _, Payload},
};
use rand::{RngCore as _, rng};

use super::{Algorithm, Error, KeyHandle, wire};

pub(crate) const NONCE_LEN: usize = 12;

// This makes more sense in base64 ("envB")
const SEALED_MAGIC: [u8; 3] = [0x7a, 0x7b, 0xc1];

/// An AEAD capability bound to exactly one key handle.
///
/// A primitive is built on demand from a handle, used for a single seal or open, and
/// dropped.  It is never persisted, and it never outlives the operation that needed
/// it.
pub(crate) enum AeadPrimitive {
	Aes128Gcm(Aes128Gcm),
	Aes256Gcm(Aes256Gcm),
	ChaCha20Poly1305(ChaCha20Poly1305),
}

impl AeadPrimitive {
	/// Build the primitive for the handle's algorithm, from the handle's key
	/// material.
	pub(crate) fn new(handle: &KeyHandle) -> Result<Self, Error> {
		let material = handle.expose_secret();

		match handle.algorithm() {
			Algorithm::Aes128Gcm => Aes128Gcm::new_from_slice(material).map(Self::Aes128Gcm),
			Algorithm::Aes256Gcm => Aes256Gcm::new_from_slice(material).map(Self::Aes256Gcm),
			Algorithm::ChaCha20Poly1305 => {
				ChaCha20Poly1305::new_from_slice(material).map(Self::ChaCha20Poly1305)
			}
		}
		.map_err(|_| {
			Error::primitive_creation("key material length does not match the handle's algorithm")
		})
	}

	/// Authenticated encryption with a fresh nonce per call.
	///
	/// Repeated calls on identical plaintext produce different output, because every
	/// call draws its own nonce.  The nonce is bound into the additional data along
	/// with the caller's context.
	#[tracing::instrument(level = "debug", skip_all)]
	pub(crate) fn seal(&self, plaintext: &[u8], ctx: &[u8]) -> Result<Vec<u8>, Error> {
		let mut nonce = [0u8; NONCE_LEN];
		rng().fill_bytes(&mut nonce);

		let mut aad = Vec::with_capacity(ctx.len() + NONCE_LEN);
		aad.extend_from_slice(ctx);
		aad.extend_from_slice(&nonce);

		let payload = Payload {
			msg: plaintext,
			aad: &aad,
		};

		let ciphertext = match self {
			Self::Aes128Gcm(cipher) => cipher.encrypt((&nonce).into(), payload),
			Self::Aes256Gcm(cipher) => cipher.encrypt((&nonce).into(), payload),
			Self::ChaCha20Poly1305(cipher) => cipher.encrypt((&nonce).into(), payload),
		}
		.map_err(|_| Error::Seal)?;

		SealedMessage { nonce, ciphertext }.to_bytes()
	}

	/// Authenticated decryption.  Fails closed: tampering, truncation, a wrong key,
	/// or a wrong context all yield an error, never partial plaintext.
	#[tracing::instrument(level = "debug", skip_all)]
	pub(crate) fn open(&self, sealed: &[u8], ctx: &[u8]) -> Result<Vec<u8>, Error> {
		let sealed = SealedMessage::try_from(sealed)?;

		let mut aad = Vec::with_capacity(ctx.len() + NONCE_LEN);
		aad.extend_from_slice(ctx);
		aad.extend_from_slice(&sealed.nonce);

		let payload = Payload {
			msg: &sealed.ciphertext,
			aad: &aad,
		};

		match self {
			Self::Aes128Gcm(cipher) => cipher.decrypt((&sealed.nonce).into(), payload),
			Self::Aes256Gcm(cipher) => cipher.decrypt((&sealed.nonce).into(), payload),
			Self::ChaCha20Poly1305(cipher) => cipher.decrypt((&sealed.nonce).into(), payload),
		}
		.map_err(|_| Error::Open)
	}
}

#[derive(Clone, Debug)]
struct SealedMessage {
	nonce: [u8; NONCE_LEN],
	ciphertext: Vec<u8>,
}

impl SealedMessage {
	fn to_bytes(&self) -> Result<Vec<u8>, Error> {
		use ciborium_ll::{Encoder, Header};

		let mut v: Vec<u8> = Vec::new();

		v.extend_from_slice(&SEALED_MAGIC);

		let mut enc = Encoder::from(&mut v);
		enc.push(Header::Array(Some(2)))
			.map_err(|e| Error::encoding("sealed message", e))?;
		enc.bytes(&self.nonce, None)
			.map_err(|e| Error::encoding("nonce", e))?;
		enc.bytes(&self.ciphertext, None)
			.map_err(|e| Error::encoding("ciphertext", e))?;

		Ok(v)
	}
}

impl TryFrom<&[u8]> for SealedMessage {
	type Error = Error;

	fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
		use ciborium_ll::Decoder;

		if b.len() < SEALED_MAGIC.len() + NONCE_LEN + 2 {
			return Err(Error::malformed("sealed message", "too short"));
		}

		if b[0..3] != SEALED_MAGIC {
			return Err(Error::malformed("sealed message", "incorrect magic"));
		}

		let mut dec = Decoder::from(&b[3..]);

		wire::pull_array(&mut dec, 2, "sealed message")?;

		let nonce: [u8; NONCE_LEN] = wire::pull_bytes(&mut dec, "nonce")?
			.as_slice()
			.try_into()
			.map_err(|_| Error::malformed("nonce", "incorrect length"))?;

		let ciphertext = wire::pull_bytes(&mut dec, "ciphertext")?;

		Ok(Self { nonce, ciphertext })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::key::generate_dek;

	fn primitive_for(algorithm: Algorithm) -> AeadPrimitive {
		AeadPrimitive::new(&KeyHandle::generate(algorithm).unwrap()).unwrap()
	}

	#[test]
	fn seal_open_round_trip_for_every_algorithm() {
		for algorithm in [
			Algorithm::Aes128Gcm,
			Algorithm::Aes256Gcm,
			Algorithm::ChaCha20Poly1305,
		] {
			let primitive = primitive_for(algorithm);

			let sealed = primitive.seal(b"hello, world!", b"test").unwrap();

			assert_eq!(
				b"hello, world!".to_vec(),
				primitive.open(&sealed, b"test").unwrap()
			);
		}
	}

	#[test]
	fn sealing_twice_differs() {
		let primitive = primitive_for(Algorithm::Aes128Gcm);

		let first = primitive.seal(b"hello, world!", b"").unwrap();
		let second = primitive.seal(b"hello, world!", b"").unwrap();

		assert_ne!(first, second);
	}

	#[test]
	fn wrong_key_fails_to_open() {
		let sealer = primitive_for(Algorithm::Aes128Gcm);
		let opener = primitive_for(Algorithm::Aes128Gcm);

		let sealed = sealer.seal(b"hello, world!", b"").unwrap();

		let result = opener.open(&sealed, b"");
		assert!(matches!(result, Err(Error::Open)));
	}

	#[test]
	fn context_matters() {
		let primitive = primitive_for(Algorithm::Aes128Gcm);

		let sealed = primitive.seal(b"hello, world!", b"context").unwrap();

		let result = primitive.open(&sealed, b"a different context");
		assert!(matches!(result, Err(Error::Open)));
	}

	#[test]
	fn incorrect_magic_is_rejected() {
		let primitive = primitive_for(Algorithm::Aes128Gcm);

		let mut sealed = primitive.seal(b"hello, world!", b"").unwrap();
		sealed[0] ^= 0xff;

		let result = primitive.open(&sealed, b"");
		assert!(matches!(result, Err(Error::Malformed { .. })));
	}

	#[test]
	fn truncation_is_rejected() {
		let primitive = primitive_for(Algorithm::Aes128Gcm);

		let sealed = primitive.seal(b"hello, world!", b"").unwrap();

		let result = primitive.open(&sealed[0..sealed.len() - 1], b"");
		assert!(result.is_err());
	}

	#[test]
	fn relabelled_algorithm_never_reaches_a_primitive() {
		// A DEK handle is 16 bytes of AES-128-GCM material; relabel it as an
		// algorithm that wants 32 bytes and it must be rejected before anyone can
		// try to build a primitive from it.
		let dek = generate_dek().unwrap();

		let mut encoded = dek.to_cleartext().unwrap();
		// magic + array header, then the algorithm ID byte
		encoded[4] = 0x02;

		let result = KeyHandle::from_cleartext(&encoded);
		assert!(matches!(result, Err(Error::InvalidKey(_))));
	}
}
