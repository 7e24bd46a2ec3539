use ciborium_ll::{Decoder, Header};

use super::Error;

// CBOR's great, until you have to deal with segmented bytestrings...  Every framing in
// this crate decodes byte strings, so the segment-pulling dance lives here, once.

pub(crate) fn pull_array(
	dec: &mut Decoder<&[u8]>,
	len: usize,
	element: &'static str,
) -> Result<(), Error> {
	match dec.pull().map_err(|e| Error::decoding(element, e))? {
		Header::Array(Some(n)) if n == len => Ok(()),
		_ => Err(Error::malformed(element, "expected fixed-length array")),
	}
}

pub(crate) fn pull_positive(
	dec: &mut Decoder<&[u8]>,
	element: &'static str,
) -> Result<u64, Error> {
	match dec.pull().map_err(|e| Error::decoding(element, e))? {
		Header::Positive(n) => Ok(n),
		_ => Err(Error::malformed(element, "expected unsigned integer")),
	}
}

pub(crate) fn pull_bytes(
	dec: &mut Decoder<&[u8]>,
	element: &'static str,
) -> Result<Vec<u8>, Error> {
	let Header::Bytes(len) = dec.pull().map_err(|e| Error::decoding(element, e))? else {
		return Err(Error::malformed(element, "expected byte string"));
	};

	let mut segments = dec.bytes(len);

	let Ok(Some(mut segment)) = segments.pull() else {
		return Err(Error::malformed(element, "missing byte string segment"));
	};

	let mut buf = [0u8; 1024];
	let mut bytes: Vec<u8> = Vec::new();

	while let Some(chunk) = segment
		.pull(&mut buf[..])
		.map_err(|e| Error::decoding(element, e))?
	{
		bytes.extend_from_slice(chunk);
	}

	Ok(bytes)
}
