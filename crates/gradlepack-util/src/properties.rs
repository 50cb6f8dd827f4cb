//! Reading, merging, and writing Java `.properties` files.
//!
//! Parsing follows `java.util.Properties#load`: `#`/`!` comments, `=`, `:` or
//! whitespace separators, backslash line continuations, and `\uXXXX` escapes.
//! Entries keep insertion order so a rewritten file stays stable across runs.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use crate::error::UtilError;

/// An ordered set of `key=value` properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties from text.
    ///
    /// A key that appears twice keeps its first position and its last value.
    ///
    /// # Errors
    /// Returns an error if a `\u` escape is malformed or an unpaired surrogate.
    pub fn parse(content: &str) -> Result<Self, UtilError> {
        let mut props = Self::new();
        for (line_no, logical) in logical_lines(content) {
            let (key, value) =
                split_entry(&logical).map_err(|message| UtilError::Properties {
                    line: line_no,
                    message,
                })?;
            props.set(key, value);
        }
        Ok(props)
    }

    /// Read and parse a properties file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid properties.
    pub fn from_path(path: &Path) -> Result<Self, UtilError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| UtilError::io("read", path, source))?;
        Self::parse(&content)
    }

    /// Read a properties file, treating a missing file as empty.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_path_or_default(path: &Path) -> Result<Self, UtilError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(source) => Err(UtilError::io("read", path, source)),
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, returning the previous one if the key was present.
    pub fn set(&mut self, key: String, value: String) -> Option<String> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Overlay `other` onto `self`: every key of `other` wins, keys only in
    /// `self` survive untouched, new keys are appended in `other`'s order.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// Iterate keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `key=value` lines with Java escaping.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            escape_into(&mut out, key, true);
            out.push('=');
            escape_into(&mut out, value, false);
            out.push('\n');
        }
        out
    }

    /// Write the rendered properties to `path`, replacing its content.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<(), UtilError> {
        crate::fs::write_replacing(path, self.render().as_bytes())
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Join continued physical lines and drop comments and blank lines.
///
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim_start_matches(is_blank);
        let continuing = current.is_some();

        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        let continues = trailing % 2 == 1;
        let body = if continues {
            line.strip_suffix('\\').unwrap_or(line)
        } else {
            line
        };

        let (start, mut text) = current.take().unwrap_or((idx + 1, String::new()));
        text.push_str(body);

        if continues {
            current = Some((start, text));
        } else {
            out.push((start, text));
        }
    }

    if let Some(pending) = current {
        out.push(pending);
    }
    out
}

fn split_entry(line: &str) -> Result<(String, String), String> {
    let mut chars = line.chars().peekable();
    let mut key = String::new();
    let mut separated = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => unescape(&mut chars, &mut key)?,
            '=' | ':' => {
                separated = true;
                break;
            }
            c if is_blank(c) => break,
            c => key.push(c),
        }
    }

    while chars.next_if(|c| is_blank(*c)).is_some() {}
    if !separated && chars.next_if(|c| *c == '=' || *c == ':').is_some() {
        while chars.next_if(|c| is_blank(*c)).is_some() {}
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            unescape(&mut chars, &mut value)?;
        } else {
            value.push(c);
        }
    }

    Ok((key, value))
}

fn unescape(chars: &mut Peekable<Chars<'_>>, out: &mut String) -> Result<(), String> {
    let Some(c) = chars.next() else {
        return Ok(());
    };
    match c {
        't' => out.push('\t'),
        'n' => out.push('\n'),
        'r' => out.push('\r'),
        'f' => out.push('\x0c'),
        'u' => {
            let unit = code_unit(chars)?;
            let decoded = if (0xD800..0xDC00).contains(&unit) {
                // High surrogate: Java writes non-BMP characters as a pair.
                let mut lookahead = chars.clone();
                let low = match (lookahead.next(), lookahead.next()) {
                    (Some('\\'), Some('u')) => Some(code_unit(&mut lookahead)?),
                    _ => None,
                };
                let pair = low
                    .filter(|low| (0xDC00..0xE000).contains(low))
                    .and_then(|low| char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)));
                if pair.is_some() {
                    *chars = lookahead;
                }
                pair
            } else {
                char::from_u32(unit)
            };
            out.push(decoded.ok_or_else(|| format!("unpaired surrogate \"\\u{unit:04X}\""))?);
        }
        other => out.push(other),
    }
    Ok(())
}

/// Read the four hex digits of a `\uXXXX` escape.
fn code_unit(chars: &mut Peekable<Chars<'_>>) -> Result<u32, String> {
    let hex: String = chars.by_ref().take(4).collect();
    u32::from_str_radix(&hex, 16)
        .ok()
        .filter(|_| hex.len() == 4)
        .ok_or_else(|| format!("malformed \\uxxxx escape \"\\u{hex}\""))
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (idx, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WRAPPER_DEFAULTS: &str = "\
distributionBase=GRADLE_USER_HOME
distributionPath=wrapper/dists
distributionUrl=https\\://services.gradle.org/distributions/gradle-7.6-bin.zip
networkTimeout=10000
zipStoreBase=GRADLE_USER_HOME
zipStorePath=wrapper/dists
";

    #[test]
    fn parses_escaped_colon_in_url() {
        let props = Properties::parse(WRAPPER_DEFAULTS).unwrap();
        assert_eq!(
            props.get("distributionUrl"),
            Some("https://services.gradle.org/distributions/gradle-7.6-bin.zip")
        );
        assert_eq!(props.get("networkTimeout"), Some("10000"));
        assert_eq!(props.len(), 6);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let props = Properties::parse("# comment\n! also\n\n   \nkey=value\n").unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn accepts_all_separators() {
        let props = Properties::parse("a=1\nb:2\nc 3\nd = 4\ne   :   5\n").unwrap();
        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some("5"));
    }

    #[test]
    fn strips_leading_whitespace() {
        let props = Properties::parse(
            "distributionUrl=https://g.o/gradle-7.5-bin.zip\n\t\t\t\t\t\t networkTimeout=43",
        )
        .unwrap();
        assert_eq!(props.get("networkTimeout"), Some("43"));
        assert_eq!(
            props.get("distributionUrl"),
            Some("https://g.o/gradle-7.5-bin.zip")
        );
    }

    #[test]
    fn joins_continuation_lines() {
        let props = Properties::parse("jvmargs=-Xmx2g \\\n    -Dfile.encoding=UTF-8\n").unwrap();
        assert_eq!(props.get("jvmargs"), Some("-Xmx2g -Dfile.encoding=UTF-8"));
    }

    #[test]
    fn even_backslashes_do_not_continue() {
        let props = Properties::parse("path=C\\:\\\\\nnext=1\n").unwrap();
        assert_eq!(props.get("path"), Some("C:\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn decodes_unicode_escapes() {
        let props = Properties::parse("name=caf\\u00e9\n").unwrap();
        assert_eq!(props.get("name"), Some("café"));
    }

    #[test]
    fn decodes_surrogate_pair_escapes() {
        let props = Properties::parse("name=\\uD83D\\uDE00 ok\n").unwrap();
        assert_eq!(props.get("name"), Some("\u{1F600} ok"));
    }

    #[test]
    fn rejects_unpaired_surrogate() {
        let err = Properties::parse("name=\\uD83Dx\n").unwrap_err();
        assert!(err.to_string().contains("unpaired surrogate"));
    }

    #[test]
    fn rejects_short_unicode_escape() {
        let err = Properties::parse("ok=1\nbad=\\u12\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn duplicate_key_keeps_position_and_last_value() {
        let props = Properties::parse("a=1\nb=2\na=3\n").unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(props.get("a"), Some("3"));
    }

    #[test]
    fn merge_overrides_and_keeps_defaults() {
        let mut defaults = Properties::parse(WRAPPER_DEFAULTS).unwrap();
        let bound = Properties::parse(
            "distributionUrl=https://g.o/gradle-7.5-bin.zip\nnetworkTimeout=43\nextra=yes\n",
        )
        .unwrap();

        defaults.merge(&bound);

        assert_eq!(defaults.get("networkTimeout"), Some("43"));
        assert_eq!(
            defaults.get("distributionUrl"),
            Some("https://g.o/gradle-7.5-bin.zip")
        );
        assert_eq!(defaults.get("zipStorePath"), Some("wrapper/dists"));
        assert_eq!(defaults.keys().last(), Some("extra"));
        assert_eq!(defaults.len(), 7);
    }

    #[test]
    fn render_escapes_like_java() {
        let mut props = Properties::new();
        props.set(
            "distributionUrl".to_owned(),
            "https://services.gradle.org/x.zip".to_owned(),
        );
        props.set("a key".to_owned(), " lead".to_owned());
        assert_eq!(
            props.render(),
            "distributionUrl=https\\://services.gradle.org/x.zip\na\\ key=\\ lead\n"
        );
    }

    #[test]
    fn write_to_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gradle.properties");
        let props = Properties::parse(WRAPPER_DEFAULTS).unwrap();

        props.write_to(&path).unwrap();

        assert_eq!(Properties::from_path(&path).unwrap(), props);
    }

    #[test]
    fn missing_file_is_empty_default() {
        let tmp = tempfile::tempdir().unwrap();
        let props = Properties::from_path_or_default(&tmp.path().join("absent")).unwrap();
        assert!(props.is_empty());
    }

    proptest! {
        #[test]
        fn render_parse_preserves_entries(
            entries in proptest::collection::vec(("[a-zA-Z.:= #!\\\\]{1,12}", "\\PC{0,24}"), 0..8)
        ) {
            let mut props = Properties::new();
            for (k, v) in entries {
                props.set(k, v);
            }
            let reparsed = Properties::parse(&props.render()).unwrap();
            prop_assert_eq!(reparsed, props);
        }

        #[test]
        fn render_is_deterministic(
            entries in proptest::collection::vec(("[a-z]{1,8}", "[ -~]{0,16}"), 0..8)
        ) {
            let mut a = Properties::new();
            let mut b = Properties::new();
            for (k, v) in entries {
                a.set(k.clone(), v.clone());
                b.set(k, v);
            }
            prop_assert_eq!(a.render(), b.render());
        }
    }
}
