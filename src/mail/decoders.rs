use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use charset::Charset;
use mailparse::MailHeaderMap;

use crate::domain::email::MessageSummary;
use crate::error::{MonitorError, MonitorResult};

// Mailers are sloppy about `=` padding in B-encoded words.
const B_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// One `=?charset?enc?text?=` token.
#[derive(Debug)]
struct EncodedWord<'a> {
    raw: &'a str,
    charset: String,
    base64: bool,
    text: &'a str,
}

/// A piece of a header value: either literal text or a run of adjacent
/// encoded-words sharing one charset.
#[derive(Debug)]
enum Segment<'a> {
    Plain(&'a str),
    Encoded(Vec<EncodedWord<'a>>),
}

/// Decode a header value that may mix plain text and RFC 2047 encoded-words.
///
/// Each segment is decoded on its own and the results are joined with a
/// single space. Bytes that do not decode in their charset are replaced with
/// U+FFFD; this never fails.
pub fn decode_header_value(raw: &[u8]) -> String {
    let text = unfold(&String::from_utf8_lossy(raw));

    split_segments(&text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(s) => s.to_string(),
            Segment::Encoded(words) => decode_run(&words),
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Payload bytes of the whole run are joined before the charset decode, so
/// a character split across two words survives.
fn decode_run(words: &[EncodedWord<'_>]) -> String {
    let literal = || {
        words
            .iter()
            .map(|w| w.raw)
            .collect::<Vec<_>>()
            .join(" ")
    };

    let Some(charset) = words.first().and_then(|w| Charset::for_label(w.charset.as_bytes()))
    else {
        return literal();
    };

    let mut bytes = Vec::new();
    for word in words {
        let decoded = if word.base64 {
            B_ENGINE.decode(word.text).ok()
        } else {
            decode_q(word.text)
        };
        match decoded {
            Some(b) => bytes.extend_from_slice(&b),
            None => return literal(),
        }
    }

    let (text, _had_errors) = charset.decode_without_bom_handling(&bytes);
    text.trim().to_string()
}

/// RFC 2047 "Q": quoted-printable with `_` for space.
fn decode_q(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = [bytes.next()?, bytes.next()?];
                let hex = std::str::from_utf8(&hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
            }
            _ => out.push(b),
        }
    }
    Some(out)
}

fn unfold(s: &str) -> String {
    s.replace("\r\n", "").replace('\n', "")
}

fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some((start, word)) = find_encoded_word(rest) else {
            push_plain(&mut segments, rest);
            break;
        };

        let before = &rest[..start];
        rest = &rest[start + word.raw.len()..];

        if before.trim().is_empty()
            && let Some(Segment::Encoded(words)) = segments.last_mut()
            && words[0].charset == word.charset
        {
            words.push(word);
            continue;
        }
        push_plain(&mut segments, before);
        segments.push(Segment::Encoded(vec![word]));
    }

    segments
}

fn push_plain<'a>(segments: &mut Vec<Segment<'a>>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        segments.push(Segment::Plain(s));
    }
}

/// Locate the first well-formed encoded-word in `s`, with its byte offset.
fn find_encoded_word(s: &str) -> Option<(usize, EncodedWord<'_>)> {
    let mut from = 0;
    while let Some(offset) = s[from..].find("=?") {
        let start = from + offset;
        if let Some(word) = parse_encoded_word(&s[start..]) {
            return Some((start, word));
        }
        from = start + 2;
    }
    None
}

fn parse_encoded_word(s: &str) -> Option<EncodedWord<'_>> {
    let body = s.strip_prefix("=?")?;
    let (charset, after_charset) = body.split_once('?')?;
    let (encoding, after_encoding) = after_charset.split_once('?')?;
    let text_len = after_encoding.find("?=")?;
    let text = &after_encoding[..text_len];

    let valid = !charset.is_empty()
        && !charset.contains(char::is_whitespace)
        && matches!(encoding, "B" | "b" | "Q" | "q")
        && !text.contains(char::is_whitespace);
    if !valid {
        return None;
    }

    let len = 2 + charset.len() + 1 + encoding.len() + 1 + text_len + 2;
    Some(EncodedWord {
        raw: &s[..len],
        // language tag (RFC 2231) is irrelevant to decoding
        charset: charset
            .split('*')
            .next()
            .unwrap_or(charset)
            .to_ascii_lowercase(),
        base64: encoding.eq_ignore_ascii_case("b"),
        text,
    })
}

/// Build a summary from a raw header block.
pub fn summarize_headers(uid: u32, raw: &[u8]) -> MonitorResult<MessageSummary> {
    let (headers, _) = mailparse::parse_headers(raw).map_err(|e| MonitorError::Fetch {
        uid: uid.to_string(),
        reason: format!("unparseable header block: {e}"),
    })?;

    let raw_value = |name: &str| {
        headers
            .get_first_header(name)
            .map(|h| h.get_value_raw().to_vec())
            .unwrap_or_default()
    };

    Ok(MessageSummary {
        id: uid.to_string(),
        sender: decode_header_value(&raw_value("From")),
        subject: decode_header_value(&raw_value("Subject")),
        date: unfold(&String::from_utf8_lossy(&raw_value("Date")))
            .trim()
            .to_string(),
    })
}
