//! Text decoding for Japanese CSV sources.
//!
//! Sources are either UTF-8 or Shift_JIS. Decoding is strict: a Shift_JIS
//! decode that needed replacement characters counts as a failure.

use super::provider::DataError;
use encoding_rs::SHIFT_JIS;

/// Which decoder produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    ShiftJis,
}

/// Strict UTF-8 (leading BOM stripped), falling back to Shift_JIS.
pub fn decode_utf8_or_sjis(bytes: &[u8]) -> Result<(String, TextEncoding), DataError> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(text) => Ok((text.to_string(), TextEncoding::Utf8)),
        Err(_) => decode_sjis(bytes).map(|text| (text, TextEncoding::ShiftJis)),
    }
}

/// Strict Shift_JIS.
pub fn decode_sjis(bytes: &[u8]) -> Result<String, DataError> {
    let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DataError::Undecodable);
    }
    Ok(text.into_owned())
}
