use zeroize::Zeroizing;

use super::{Error, KeyHandle, aead::AeadPrimitive};

// The DEK envelope: a wrapped DEK is its canonical encoding, sealed under an AEAD
// primitive built from the KEK.  That seal is the entire confidentiality and
// integrity story for the DEK, so nothing about the blob is inspectable without the
// KEK.
//
// No associated data is bound into the wrap; binding a purpose string or recipient
// here would be a compatible extension.

/// Wrap a DEK under the KEK, producing the opaque encrypted-DEK blob.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn wrap(kek: &KeyHandle, dek: &KeyHandle) -> Result<Vec<u8>, Error> {
	let primitive = AeadPrimitive::new(kek)?;

	let serialized = dek.encode()?;

	primitive.seal(&serialized, b"").map_err(|e| {
		tracing::debug!(cause = %e, "DEK wrap failed");
		Error::Wrap
	})
}

/// Recover a DEK from its encrypted blob, using the KEK.
///
/// Authentication failure, a mangled blob, and a blob whose contents aren't a valid
/// key handle are all reported as [`Error::Unwrap`]: to anyone without the right KEK
/// they are indistinguishable, and saying more would only help an attacker probe the
/// envelope.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn unwrap(kek: &KeyHandle, blob: &[u8]) -> Result<KeyHandle, Error> {
	let primitive = AeadPrimitive::new(kek)?;

	let serialized = Zeroizing::new(primitive.open(blob, b"").map_err(|e| {
		tracing::debug!(cause = %e, "DEK blob failed to open");
		Error::Unwrap
	})?);

	KeyHandle::decode(&serialized).map_err(|e| {
		tracing::debug!(cause = %e, "unwrapped bytes are not a key handle");
		Error::Unwrap
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::key::{Algorithm, generate_dek};

	#[test]
	fn wrap_unwrap_round_trip() {
		let kek = KeyHandle::generate(Algorithm::Aes128Gcm).unwrap();
		let dek = generate_dek().unwrap();

		let blob = wrap(&kek, &dek).unwrap();
		let recovered = unwrap(&kek, &blob).unwrap();

		assert_eq!(dek.algorithm(), recovered.algorithm());
		assert_eq!(dek.expose_secret(), recovered.expose_secret());
	}

	#[test]
	fn wrong_kek_cannot_unwrap() {
		let kek = KeyHandle::generate(Algorithm::Aes128Gcm).unwrap();
		let other_kek = KeyHandle::generate(Algorithm::Aes128Gcm).unwrap();
		let dek = generate_dek().unwrap();

		let blob = wrap(&kek, &dek).unwrap();

		let result = unwrap(&other_kek, &blob);
		assert!(matches!(result, Err(Error::Unwrap)));
	}

	#[test]
	fn tampered_blob_cannot_unwrap() {
		let kek = KeyHandle::generate(Algorithm::Aes128Gcm).unwrap();
		let dek = generate_dek().unwrap();

		let mut blob = wrap(&kek, &dek).unwrap();
		let last = blob.len() - 1;
		blob[last] ^= 0x01;

		let result = unwrap(&kek, &blob);
		assert!(matches!(result, Err(Error::Unwrap)));
	}

	#[test]
	fn garbage_cannot_unwrap() {
		let kek = KeyHandle::generate(Algorithm::Aes128Gcm).unwrap();

		let result = unwrap(&kek, b"not a blob at all");
		assert!(matches!(result, Err(Error::Unwrap)));
	}

	#[test]
	fn chacha_kek_wraps_too() {
		let kek = KeyHandle::generate(Algorithm::ChaCha20Poly1305).unwrap();
		let dek = generate_dek().unwrap();

		let blob = wrap(&kek, &dek).unwrap();
		let recovered = unwrap(&kek, &blob).unwrap();

		assert_eq!(dek.expose_secret(), recovered.expose_secret());
	}
}
