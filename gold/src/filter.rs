//! Content filters applied before golden files are written or compared.
//!
//! A filter maps a byte sequence to a byte sequence. Filters are pure: they have
//! no access to the filesystem or to runner state, and the built-in ones are
//! safe to apply repeatedly. A runner applies its filters in insertion order,
//! first to last, so the pipeline as a whole is order-sensitive.
//!
//! # Example
//!
//! ```
//! use gold::filter::{BcryptHashes, Filter, TimeRfc3339};
//!
//! let out = TimeRfc3339.apply(b"created at 2021-03-04T05:06:07Z");
//! assert_eq!(&*out, b"created at 0000-00-00T00:00:00Z");
//!
//! let untouched = BcryptHashes.apply(b"no hash here");
//! assert_eq!(&*untouched, b"no hash here");
//! ```

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::{NoExpand, Regex};
use serde::de::IgnoredAny;

use crate::error::Error;
use crate::trace_categories;

const RFC3339_PATTERN: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z";
const BCRYPT_HASH_PREFIX_PATTERN: &str = r"\$2[ayb]\$";
const BCRYPT_HASH_CHARS: usize = 56;
const UUID_PATTERN: &str = r"[0123456789abcdef-]{36}";

/// Replacement for RFC3339 timestamps.
pub const RFC3339_REPLACEMENT: &str = "0000-00-00T00:00:00Z";
/// Replacement for bcrypt hashes.
pub const BCRYPT_HASH_REPLACEMENT: &str = "_HASH_";
/// Replacement for UUIDs.
pub const UUID_REPLACEMENT: &str = "00000000-0000-0000-0000-000000000000";

static RFC3339_REGEX: LazyLock<Regex> = LazyLock::new(|| builtin_regex(RFC3339_PATTERN));
static BCRYPT_HASH_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| builtin_regex(BCRYPT_HASH_PREFIX_PATTERN));
static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| builtin_regex(UUID_PATTERN));

// The built-in patterns are constants exercised by this module's tests.
#[allow(clippy::expect_used)]
fn builtin_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in filter pattern should compile")
}

/// A transformation applied to content before it is stored or compared.
///
/// Implemented by the built-in filters in this module and by any closure of
/// the form `Fn(&[u8]) -> Vec<u8>`.
pub trait Filter: Send + Sync {
    /// Applies the filter, borrowing the input back when nothing changed.
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]>;
}

impl<F> Filter for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        Cow::Owned(self(content))
    }
}

/// Runs `content` through each filter in order and returns the result.
///
/// The content stays borrowed until a filter actually changes it.
pub fn apply_filters<'a>(filters: &[Box<dyn Filter>], content: &'a [u8]) -> Cow<'a, [u8]> {
    let mut filtered = Cow::Borrowed(content);

    for filter in filters {
        let changed = match filter.apply(&filtered) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(changed) => changed,
        };
        filtered = Cow::Owned(changed);
    }

    filtered
}

/// Pretty-prints JSON content, one tab per indentation level.
///
/// Only whitespace between tokens changes. Keys (duplicates included), string
/// escapes and number literals are copied as written, leading whitespace is
/// dropped and trailing whitespace is kept.
///
/// # Panics
///
/// Applying this filter to content that is not valid JSON panics. Use
/// [`try_format_json`] to get a recoverable error instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatJson;

impl Filter for FormatJson {
    #[allow(clippy::panic)]
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        match try_format_json(content) {
            Ok(formatted) => Cow::Owned(formatted),
            Err(err) => panic!("gold: cannot format content as JSON: {err}"),
        }
    }
}

/// Pretty-prints JSON content the same way as [`FormatJson`], reporting
/// malformed input as an error.
pub fn try_format_json(content: &[u8]) -> Result<Vec<u8>, Error> {
    serde_json::from_slice::<IgnoredAny>(content).map_err(Error::InvalidJson)?;

    let start = content
        .iter()
        .position(|byte| !is_json_space(*byte))
        .unwrap_or(content.len());
    let end = content
        .iter()
        .rposition(|byte| !is_json_space(*byte))
        .map_or(start, |pos| pos + 1);

    let mut formatted = Vec::with_capacity(content.len() * 2);
    let mut depth = 0usize;
    let mut needs_indent = false;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in &content[start..end] {
        if in_string {
            formatted.push(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        if is_json_space(byte) {
            continue;
        }

        // Opening brackets are only followed by a line break when the
        // container turns out to be non-empty.
        if needs_indent && byte != b'}' && byte != b']' {
            needs_indent = false;
            depth += 1;
            push_json_newline(&mut formatted, depth);
        }

        match byte {
            b'"' => {
                in_string = true;
                formatted.push(byte);
            }
            b'{' | b'[' => {
                needs_indent = true;
                formatted.push(byte);
            }
            b',' => {
                formatted.push(byte);
                push_json_newline(&mut formatted, depth);
            }
            b':' => formatted.extend_from_slice(b": "),
            b'}' | b']' => {
                if needs_indent {
                    needs_indent = false;
                } else {
                    depth = depth.saturating_sub(1);
                    push_json_newline(&mut formatted, depth);
                }
                formatted.push(byte);
            }
            _ => formatted.push(byte),
        }
    }

    formatted.extend_from_slice(&content[end..]);

    Ok(formatted)
}

const fn is_json_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn push_json_newline(formatted: &mut Vec<u8>, depth: usize) {
    formatted.push(b'\n');
    formatted.extend(std::iter::repeat_n(b'\t', depth));
}

/// Replaces `YYYY-MM-DDTHH:MM:SSZ` timestamps with `0000-00-00T00:00:00Z`.
///
/// Only the `Z` form is recognized. Anything following the `Z` (such as a
/// numeric offset) is left as is.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeRfc3339;

impl Filter for TimeRfc3339 {
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        replace_builtin(&RFC3339_REGEX, content, RFC3339_REPLACEMENT)
    }
}

/// Replaces bcrypt hashes (`$2a$`, `$2b$` or `$2y$` followed by 56
/// characters) with `_HASH_`.
///
/// Any character but a newline counts toward the 56. Every byte that is not
/// part of a valid UTF-8 sequence counts as one character.
#[derive(Clone, Copy, Debug, Default)]
pub struct BcryptHashes;

impl Filter for BcryptHashes {
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        let mut replaced: Option<Vec<u8>> = None;
        let mut copied_up_to = 0;
        let mut search_from = 0;

        while let Some(prefix) = BCRYPT_HASH_PREFIX_REGEX.find_at(content, search_from) {
            let Some(body_len) = hash_body_len(&content[prefix.end()..]) else {
                search_from = prefix.start() + 1;
                continue;
            };

            let out = replaced.get_or_insert_with(|| Vec::with_capacity(content.len()));
            out.extend_from_slice(&content[copied_up_to..prefix.start()]);
            out.extend_from_slice(BCRYPT_HASH_REPLACEMENT.as_bytes());

            copied_up_to = prefix.end() + body_len;
            search_from = copied_up_to;
        }

        match replaced {
            Some(mut out) => {
                out.extend_from_slice(&content[copied_up_to..]);
                tracing::debug!(target: trace_categories::FILTERS, "replaced bcrypt hashes with {BCRYPT_HASH_REPLACEMENT}");
                Cow::Owned(out)
            }
            None => Cow::Borrowed(content),
        }
    }
}

/// Returns the byte length of the hash body following a bcrypt prefix, or
/// `None` when a newline or the end of the content comes first.
fn hash_body_len(after_prefix: &[u8]) -> Option<usize> {
    let mut len = 0;

    for _ in 0..BCRYPT_HASH_CHARS {
        let remaining = after_prefix.get(len..)?;
        if *remaining.first()? == b'\n' {
            return None;
        }
        len += char_width(remaining);
    }

    Some(len)
}

fn char_width(bytes: &[u8]) -> usize {
    bytes[..bytes.len().min(4)]
        .utf8_chunks()
        .next()
        .and_then(|chunk| chunk.valid().chars().next())
        .map_or(1, char::len_utf8)
}

/// Replaces UUIDs with the nil UUID.
///
/// Any run of 36 characters drawn from lowercase hex digits and `-` counts;
/// versions and variants are not validated.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uuids;

impl Filter for Uuids {
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        replace_builtin(&UUID_REGEX, content, UUID_REPLACEMENT)
    }
}

fn replace_builtin<'a>(regex: &Regex, content: &'a [u8], replacement: &str) -> Cow<'a, [u8]> {
    let replaced = regex.replace_all(content, NoExpand(replacement.as_bytes()));

    if matches!(replaced, Cow::Owned(_)) {
        tracing::debug!(target: trace_categories::FILTERS, "replaced matches of {} with {replacement}", regex.as_str());
    }

    replaced
}

/// Replaces every non-overlapping match of a pattern, left to right.
///
/// Capture group references (`$1`, `${name}`) in the replacement are expanded;
/// write `$$` for a literal dollar sign.
#[derive(Clone, Debug)]
pub struct CustomFilter {
    regex: Regex,
    replacement: Vec<u8>,
}

impl CustomFilter {
    /// Compiles `pattern` into a filter that substitutes `replacement`.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, Error> {
        Ok(Self::from_regex(Regex::new(pattern)?, replacement))
    }

    /// Creates a filter from an already compiled regex.
    pub fn from_regex(regex: Regex, replacement: impl Into<String>) -> Self {
        Self {
            regex,
            replacement: replacement.into().into_bytes(),
        }
    }

    /// Returns the pattern this filter looks for.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Filter for CustomFilter {
    fn apply<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        self.regex.replace_all(content, self.replacement.as_slice())
    }
}
