use encoding_rs::Encoding;
use thiserror::Error;

/// Candidate encodings tried in order when reading client table files. The
/// client ships CP949 text, patched files are occasionally re-saved as UTF-8,
/// and windows-1252 accepts any byte sequence as a last resort.
pub const DEFAULT_ENCODING_LABELS: &[&str] = &["euc-kr", "utf-8", "windows-1252"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown encoding label '{0}'")]
    UnknownLabel(String),
    #[error("no candidate encoding decoded the input cleanly (tried {tried})")]
    Undecodable { tried: String },
}

/// Decode raw file bytes against each candidate encoding in order, returning
/// the decoded text together with the name of the encoding that succeeded.
/// A decode that would need replacement characters counts as a failure and
/// the next candidate is tried.
pub fn decode_text(bytes: &[u8], labels: &[&str]) -> Result<(String, &'static str), DecodeError> {
    for label in labels {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| DecodeError::UnknownLabel(label.to_string()))?;
        let (text, actual, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Ok((text.into_owned(), actual.name()));
        }
    }
    Err(DecodeError::Undecodable {
        tried: labels.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_korean_bytes_as_euc_kr() {
        // "한국" in EUC-KR.
        let bytes = [0xC7, 0xD1, 0xB1, 0xB9];
        let (text, name) = decode_text(&bytes, DEFAULT_ENCODING_LABELS).unwrap();
        assert_eq!(text, "한국");
        assert_eq!(name, "EUC-KR");
    }

    #[test]
    fn falls_through_to_permissive_tail() {
        // 0xFF is invalid as an EUC-KR lead byte and as UTF-8, but
        // windows-1252 maps every byte.
        let bytes = [0x41, 0xFF, 0x42];
        let (text, name) = decode_text(&bytes, DEFAULT_ENCODING_LABELS).unwrap();
        assert_eq!(name, "windows-1252");
        assert_eq!(text, "A\u{ff}B");
    }

    #[test]
    fn exhausted_chain_is_an_error() {
        let bytes = [0xFF, 0xFE, 0x80];
        let err = decode_text(&bytes, &["euc-kr", "utf-8"]).unwrap_err();
        assert!(matches!(err, DecodeError::Undecodable { .. }));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = decode_text(b"abc", &["definitely-not-an-encoding"]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownLabel(_)));
    }
}
