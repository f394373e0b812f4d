//! Lossless conversion between on-disk relative paths and entry keys.
//!
//! A key is the `/`-joined list of path segments. Segments are UTF-8 text
//! with two escapes so that every distinct name maps to a distinct key:
//!
//! - a literal backslash is written `\\`;
//! - a byte that is not valid UTF-8 is written `\xNN` (unix), an unpaired
//!   UTF-16 surrogate `\u{NNNN}` (windows).
//!
//! Names that are valid UTF-8 and contain no backslash are kept as they are.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;

/// Build the key of a root-relative `path`.
pub fn relative_key(path: &Path) -> CompactString {
    let mut key = CompactString::default();
    for component in path.components() {
        if let Component::Normal(name) = component {
            if !key.is_empty() {
                key.push('/');
            }
            push_segment(&mut key, name);
        }
    }
    key
}

/// Rebuild the root-relative path a key was made from.
pub fn key_to_path(key: &str) -> PathBuf {
    key.split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .collect()
}

fn push_text(key: &mut CompactString, text: &str) {
    for c in text.chars() {
        if c == '\\' {
            key.push_str("\\\\");
        } else {
            key.push(c);
        }
    }
}

#[cfg(unix)]
fn push_segment(key: &mut CompactString, name: &OsStr) {
    use std::os::unix::ffi::OsStrExt;

    for chunk in name.as_bytes().utf8_chunks() {
        push_text(key, chunk.valid());
        for byte in chunk.invalid() {
            key.push_str(&format!("\\x{byte:02x}"));
        }
    }
}

#[cfg(unix)]
fn decode_segment(segment: &str) -> OsString {
    use std::os::unix::ffi::OsStringExt;

    let mut bytes = Vec::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('\\') {
        bytes.extend_from_slice(&rest.as_bytes()[..pos]);
        rest = &rest[pos..];
        if let Some(tail) = rest.strip_prefix("\\\\") {
            bytes.push(b'\\');
            rest = tail;
        } else if let Some(byte) = rest
            .get(2..4)
            .filter(|_| rest.as_bytes().get(1) == Some(&b'x'))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            bytes.push(byte);
            rest = &rest[4..];
        } else {
            // Not an escape this module produces; keep it literally.
            bytes.push(b'\\');
            rest = &rest[1..];
        }
    }
    bytes.extend_from_slice(rest.as_bytes());
    OsString::from_vec(bytes)
}

#[cfg(windows)]
fn push_segment(key: &mut CompactString, name: &OsStr) {
    use std::os::windows::ffi::OsStrExt;

    for unit in char::decode_utf16(name.encode_wide()) {
        match unit {
            Ok('\\') => key.push_str("\\\\"),
            Ok(c) => key.push(c),
            Err(e) => key.push_str(&format!("\\u{{{:04x}}}", e.unpaired_surrogate())),
        }
    }
}

#[cfg(windows)]
fn decode_segment(segment: &str) -> OsString {
    use std::os::windows::ffi::OsStringExt;

    let mut wide: Vec<u16> = Vec::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('\\') {
        wide.extend(rest[..pos].encode_utf16());
        rest = &rest[pos..];
        if let Some(tail) = rest.strip_prefix("\\\\") {
            wide.push(u16::from(b'\\'));
            rest = tail;
        } else if let Some((unit, len)) = parse_surrogate(rest) {
            wide.push(unit);
            rest = &rest[len..];
        } else {
            wide.push(u16::from(b'\\'));
            rest = &rest[1..];
        }
    }
    wide.extend(rest.encode_utf16());
    OsString::from_wide(&wide)
}

/// Parse a leading `\u{NNNN}` escape, returning the unit and the escape length.
#[cfg(windows)]
fn parse_surrogate(text: &str) -> Option<(u16, usize)> {
    let body = text.strip_prefix("\\u{")?;
    let end = body.find('}')?;
    let unit = u16::from_str_radix(&body[..end], 16).ok()?;
    Some((unit, end + 4))
}

#[cfg(not(any(unix, windows)))]
fn push_segment(key: &mut CompactString, name: &OsStr) {
    push_text(key, &name.to_string_lossy());
}

#[cfg(not(any(unix, windows)))]
fn decode_segment(segment: &str) -> OsString {
    OsString::from(segment.replace("\\\\", "\\"))
}
