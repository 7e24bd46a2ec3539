#[derive(Debug, thiserror::Error, thiserror_ext::Construct)]
#[non_exhaustive]
pub enum Error {
	#[error("KEK could not be read from its source: {cause}")]
	KekUnavailable { cause: std::io::Error },

	#[error("failed to generate fresh key material")]
	Generation,

	#[error("cannot build an AEAD primitive from this key handle: {0}")]
	PrimitiveCreation(String),

	#[error("failed to wrap DEK under the KEK")]
	Wrap,

	#[error("failed to unwrap DEK: wrong KEK or corrupted encrypted-DEK blob")]
	Unwrap,

	#[error("failed to seal payload under the DEK")]
	Seal,

	#[error("failed to open payload: wrong DEK or corrupted ciphertext")]
	Open,

	#[error("encoding failure on {element}: {cause}")]
	Encoding {
		element: String,
		cause: std::io::Error,
	},

	#[error("decoding failure on {element}: {cause:?}")]
	Decoding {
		element: String,
		cause: ciborium_ll::Error<std::io::Error>,
	},

	#[error("malformed {element}: {reason}")]
	Malformed { element: String, reason: String },

	#[error("invalid key: {0}")]
	InvalidKey(String),
}
