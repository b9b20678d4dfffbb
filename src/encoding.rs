use std::borrow::Cow;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16LE, WINDOWS_1252};
use log::debug;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// BOM sniffing, falling back to a statistical guess over the bytes.
    Detected,
    Utf8,
    Latin1,
    Ascii,
    Utf16Le,
}

pub const CANDIDATE_ORDER: [Candidate; 5] = [
    Candidate::Detected,
    Candidate::Utf8,
    Candidate::Latin1,
    Candidate::Ascii,
    Candidate::Utf16Le,
];

#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub candidate: Candidate,
    pub encoding_name: &'static str,
}

pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<DecodedText, IngestError> {
    for candidate in CANDIDATE_ORDER {
        let Some((text, encoding_name)) = attempt(candidate, bytes) else {
            continue;
        };
        if !looks_clean(&text) {
            debug!(
                "{}: {:?} ({encoding_name}) produced decode artifacts",
                path.display(),
                candidate
            );
            continue;
        }
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string();
        return Ok(DecodedText {
            text,
            candidate,
            encoding_name,
        });
    }
    Err(IngestError::unreadable(
        path,
        "no candidate decoding produced clean text",
    ))
}

fn attempt(candidate: Candidate, bytes: &[u8]) -> Option<(Cow<'_, str>, &'static str)> {
    match candidate {
        Candidate::Detected => {
            let encoding = detect(bytes);
            // decode() strips a matching BOM itself.
            let (text, used, _) = encoding.decode(bytes);
            Some((text, used.name()))
        }
        Candidate::Utf8 => decode_with(UTF_8, bytes),
        Candidate::Latin1 => decode_with(WINDOWS_1252, bytes),
        Candidate::Ascii => {
            if !bytes.is_ascii() {
                return None;
            }
            std::str::from_utf8(bytes)
                .ok()
                .map(|s| (Cow::Borrowed(s), "US-ASCII"))
        }
        Candidate::Utf16Le => decode_with(UTF_16LE, bytes),
    }
}

fn detect(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn decode_with<'a>(
    encoding: &'static Encoding,
    bytes: &'a [u8],
) -> Option<(Cow<'a, str>, &'static str)> {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    Some((text, encoding.name()))
}

fn looks_clean(text: &str) -> bool {
    !text.contains('\u{FFFD}') && !text.contains('\0')
}
