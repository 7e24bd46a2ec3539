use super::{Error, KeyHandle, aead::AeadPrimitive, codec, key};

/// Envelope encryption under a single key-encryption key.
///
/// An [`EnvelopeBox`] holds your long-lived key-encryption key (KEK) and does the
/// whole envelope dance for you: [`create_dek`](EnvelopeBox::create_dek) mints a
/// fresh data-encryption key (DEK) and hands you back only its *wrapped* form -- an
/// opaque blob sealed under the KEK.  You store that blob alongside your data;
/// [`encrypt`](EnvelopeBox::encrypt) and [`decrypt`](EnvelopeBox::decrypt) take it
/// back, recover the DEK under the KEK, and use the DEK (never the KEK) on the
/// payload itself.
///
/// The point of the two-level hierarchy is blast-radius control.  A DEK encrypts one
/// payload (or one narrow session's worth), so losing a DEK loses that data and
/// nothing else.  The KEK only ever encrypts DEKs, so it sees a tiny number of tiny
/// plaintexts, which keeps it healthy over a very long life.
///
/// Every operation is self-contained: the DEK handle and the AEAD machinery built
/// from it live only for the duration of the one call that needed them, and the key
/// material is zeroized when they drop -- on the error paths too.
///
/// # Example
///
/// ```rust
/// use envelope_box::{Algorithm, EnvelopeBox, KeyHandle};
/// # fn main() -> Result<(), envelope_box::Error> {
///
/// // In real usage the KEK comes from a secrets store; for the example we mint one
/// let kek = KeyHandle::generate(Algorithm::Aes128Gcm)?;
/// let envelope = EnvelopeBox::new(kek);
///
/// // One fresh wrapped DEK, please
/// let dek_blob = envelope.create_dek()?;
///
/// let ciphertext = envelope.encrypt(b"attack at dawn", &dek_blob)?;
///
/// // The blob and the ciphertext travel together; both are needed to get back out
/// assert_eq!(
///     b"attack at dawn".to_vec(),
///     envelope.decrypt(&ciphertext, &dek_blob)?
/// );
///
/// // A blob from a *different* create_dek call wraps a different DEK, so the
/// // payload refuses to open
/// let other_blob = envelope.create_dek()?;
/// let result = envelope.decrypt(&ciphertext, &other_blob);
/// assert!(matches!(result, Err(envelope_box::Error::Open)));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct EnvelopeBox {
	kek: KeyHandle,
}

impl EnvelopeBox {
	/// Create an [`EnvelopeBox`] around an already-materialized KEK.
	///
	/// Where the KEK comes from is your problem (a file, a KMS, an HSM);
	/// [`KeyHandle::from_cleartext_reader`] covers the simple cases.
	pub fn new(kek: KeyHandle) -> Self {
		Self { kek }
	}

	/// Generate a fresh DEK and return it wrapped under the KEK.
	///
	/// The returned blob is the *only* representation of this DEK that exists
	/// anywhere; the cleartext handle is destroyed before this method returns.  Store
	/// the blob next to the ciphertexts it will protect.
	///
	/// # Errors
	///
	/// Returns [`Error::Generation`] if the OS RNG fails, or [`Error::Wrap`] if the
	/// DEK cannot be sealed under the KEK.  No partial blob is ever returned.
	#[tracing::instrument(level = "debug", skip(self))]
	pub fn create_dek(&self) -> Result<Vec<u8>, Error> {
		let dek = key::generate_dek()?;

		codec::wrap(&self.kek, &dek)
		// dek drops here; its material is zeroized
	}

	/// Encrypt a payload under the DEK wrapped inside `encrypted_dek`.
	///
	/// # Errors
	///
	/// Returns [`Error::Unwrap`] if the blob does not open under this KEK (wrong KEK,
	/// or a corrupted blob), and [`Error::Seal`] if payload encryption itself fails.
	#[tracing::instrument(level = "debug", skip_all)]
	pub fn encrypt(
		&self,
		plaintext: impl AsRef<[u8]>,
		encrypted_dek: impl AsRef<[u8]>,
	) -> Result<Vec<u8>, Error> {
		let dek = codec::unwrap(&self.kek, encrypted_dek.as_ref())?;
		let primitive = AeadPrimitive::new(&dek)?;

		primitive.seal(plaintext.as_ref(), b"")
	}

	/// Decrypt a payload, given the ciphertext and the wrapped DEK it was encrypted
	/// under.
	///
	/// # Errors
	///
	/// The two layers fail distinctly, so you can tell what went wrong:
	/// * [`Error::Unwrap`] -- the blob didn't open: wrong KEK, or corrupted blob.
	/// * [`Error::Open`] -- the DEK was recovered but the payload didn't
	///   authenticate: wrong blob for this ciphertext, or tampering.
	#[tracing::instrument(level = "debug", skip_all)]
	pub fn decrypt(
		&self,
		ciphertext: impl AsRef<[u8]>,
		encrypted_dek: impl AsRef<[u8]>,
	) -> Result<Vec<u8>, Error> {
		let dek = codec::unwrap(&self.kek, encrypted_dek.as_ref())?;
		let primitive = AeadPrimitive::new(&dek)?;

		primitive.open(ciphertext.as_ref(), b"")
	}
}
