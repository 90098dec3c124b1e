//! Applying the marker to rendered HTML.
//!
//! A small start-tag scanner finds every element whose `class` attribute carries the
//! navigation token, reads its `href` the way a DOM attribute read would, and rewrites
//! the `class` attribute of the selected elements in place. Everything else in the
//! document is copied through byte for byte.

use std::borrow::Cow;

use crate::sys_navmark::core::{links_to_mark, NavElement, NavMarker};

/// Elements whose contents never become document elements a selector query can reach:
/// raw text (with scripting on, `noscript` too) and `template` contents.
const SKIPPED_CONTENT_TAGS: [&str; 10] = [
    "script", "style", "textarea", "title", "noscript", "xmp", "iframe", "noembed",
    "noframes", "template",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Double,
    Single,
    Unquoted,
}

/// Location of an attribute value in the source, quotes included.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValueSpan {
    start: usize,
    end: usize,
    quote: Quote,
}

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    /// `None` for a value-less attribute (`<a href>`).
    value: Option<(String, ValueSpan)>,
}

#[derive(Debug)]
struct StartTag {
    name: String,
    attributes: Vec<Attribute>,
}

impl StartTag {
    /// First occurrence wins, as in an HTML parser.
    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A navigation element found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTag {
    pub element: NavElement,
    /// Raw `class` value, undecoded, as it appears in the source.
    raw_class: String,
    class_span: ValueSpan,
}

/// Every element carrying `nav_class` in its `class` attribute, in document order.
pub fn scan_nav_elements(html: &str, nav_class: &str) -> Vec<NavTag> {
    let bytes = html.as_bytes();
    let mut idx = 0usize;
    let mut found = Vec::new();

    while idx < bytes.len() {
        let Some(lt) = find_byte(bytes, idx, b'<') else {
            break;
        };
        idx = lt;

        if starts_with(bytes, idx, b"<!--") {
            idx = skip_comment(bytes, idx);
            continue;
        }
        if starts_with(bytes, idx, b"<!")
            || starts_with(bytes, idx, b"<?")
            || starts_with(bytes, idx, b"</")
        {
            idx = skip_to_gt(bytes, idx + 2);
            continue;
        }

        let Some((tag, next)) = parse_start_tag(html, idx) else {
            idx += 1;
            continue;
        };
        idx = next;

        if let Some(nav) = nav_tag(&tag, nav_class) {
            found.push(nav);
        }

        if SKIPPED_CONTENT_TAGS.contains(&tag.name.as_str()) {
            idx = skip_raw_text(bytes, idx, tag.name.as_bytes());
        }
    }

    found
}

/// Add the active class to every navigation element whose `href` equals `current_path`.
///
/// Returns the document unchanged (borrowed) when no element needs rewriting, so running
/// it over already-marked output is a no-op.
pub fn mark_html<'a>(html: &'a str, current_path: &str, marker: &NavMarker) -> Cow<'a, str> {
    let tags = scan_nav_elements(html, marker.nav_class());
    let elements: Vec<&NavElement> = tags.iter().map(|t| &t.element).collect();

    let edits: Vec<&NavTag> = links_to_mark(current_path, &elements)
        .into_iter()
        .map(|i| &tags[i])
        .filter(|t| !t.element.classes.contains(marker.active_class()))
        .collect();

    if edits.is_empty() {
        return Cow::Borrowed(html);
    }

    let extra = edits.len() * (marker.active_class().len() + 3);
    let mut out = String::with_capacity(html.len() + extra);
    let mut cursor = 0usize;
    for tag in edits {
        let span = &tag.class_span;
        out.push_str(&html[cursor..span.start]);
        let value = format!("{} {}", tag.raw_class.trim_end(), marker.active_class());
        match span.quote {
            Quote::Single => {
                out.push('\'');
                out.push_str(&value);
                out.push('\'');
            }
            Quote::Double => {
                out.push('"');
                out.push_str(&value);
                out.push('"');
            }
            Quote::Unquoted => {
                out.push('"');
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
        }
        cursor = span.end;
    }
    out.push_str(&html[cursor..]);
    Cow::Owned(out)
}

fn nav_tag(tag: &StartTag, nav_class: &str) -> Option<NavTag> {
    let (raw_class, class_span) = tag.attribute("class")?.value.clone()?;
    let element = NavElement::new(None, &decode_entities(&raw_class));
    if !element.classes.contains(nav_class) {
        return None;
    }
    let href = tag.attribute("href").map(|a| match &a.value {
        Some((raw, _)) => decode_entities(raw),
        None => String::new(),
    });
    Some(NavTag {
        element: NavElement { href, ..element },
        raw_class,
        class_span,
    })
}

fn parse_start_tag(html: &str, start: usize) -> Option<(StartTag, usize)> {
    let bytes = html.as_bytes();
    let mut idx = start + 1;
    if !bytes.get(idx).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }

    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx += 1;
    }
    let name = html[name_start..idx].to_ascii_lowercase();
    let mut attributes = Vec::new();

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => return Some((StartTag { name, attributes }, idx + 1)),
            Some(b'/') => {
                idx += 1;
                continue;
            }
            Some(_) => {}
        }

        let attr_start = idx;
        while idx < bytes.len() && !is_attr_name_end(bytes[idx]) {
            idx += 1;
        }
        if idx == attr_start {
            idx += 1;
            continue;
        }
        let attr_name = html[attr_start..idx].to_ascii_lowercase();

        let after_name = skip_spaces(bytes, idx);
        if bytes.get(after_name).copied() != Some(b'=') {
            attributes.push(Attribute {
                name: attr_name,
                value: None,
            });
            continue;
        }

        idx = skip_spaces(bytes, after_name + 1);
        let value_start = idx;
        let (raw, quote) = match bytes.get(idx).copied() {
            Some(q @ (b'"' | b'\'')) => {
                let close = find_byte(bytes, idx + 1, q)?;
                idx = close + 1;
                let quote = if q == b'"' { Quote::Double } else { Quote::Single };
                (&html[value_start + 1..close], quote)
            }
            _ => {
                while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>' {
                    idx += 1;
                }
                (&html[value_start..idx], Quote::Unquoted)
            }
        };

        attributes.push(Attribute {
            name: attr_name,
            value: Some((
                raw.to_string(),
                ValueSpan {
                    start: value_start,
                    end: idx,
                    quote,
                },
            )),
        });
    }
}

/// Decode character references the way an attribute read sees them: the common named
/// references plus decimal and hex numeric references. Unknown named references are
/// left as written.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    const ENTITIES: [(&str, char); 6] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
        ("&nbsp;", '\u{a0}'),
    ];

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if let Some((ch, len)) = numeric_reference(rest) {
            out.push(ch);
            rest = &rest[len..];
            continue;
        }
        match ENTITIES.iter().find(|(name, _)| rest.starts_with(name)) {
            Some((name, ch)) => {
                out.push(*ch);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `&#NN;` or `&#xHH;` at the start of `s`: the decoded char and the bytes consumed.
/// The trailing `;` is optional. NUL, surrogates and out-of-range values become U+FFFD.
fn numeric_reference(s: &str) -> Option<(char, usize)> {
    let bytes = s.as_bytes();
    if !s.starts_with("&#") {
        return None;
    }
    let (radix, digits_start) = match bytes.get(2).copied() {
        Some(b'x' | b'X') => (16, 3),
        _ => (10, 2),
    };

    let mut idx = digits_start;
    let mut value: u32 = 0;
    while let Some(digit) = bytes.get(idx).and_then(|&b| (b as char).to_digit(radix)) {
        value = value.saturating_mul(radix).saturating_add(digit);
        idx += 1;
    }
    if idx == digits_start {
        return None;
    }
    if bytes.get(idx).copied() == Some(b';') {
        idx += 1;
    }

    let ch = match value {
        0 => char::REPLACEMENT_CHARACTER,
        v => char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER),
    };
    Some((ch, idx))
}

fn skip_raw_text(bytes: &[u8], mut idx: usize, tag_name: &[u8]) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx + 1).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx + 2, tag_name)
            && tag_name_boundary(bytes, idx + 2 + tag_name.len())
        {
            return skip_to_gt(bytes, idx + 2);
        }
        idx += 1;
    }
    bytes.len()
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    // `<!-->` and `<!--->` are complete (empty) comments.
    if starts_with(bytes, start + 4, b">") {
        return start + 5;
    }
    if starts_with(bytes, start + 4, b"->") {
        return start + 6;
    }
    find_subslice(bytes, start + 4, b"-->")
        .map(|end| end + 3)
        .unwrap_or(bytes.len())
}

fn skip_to_gt(bytes: &[u8], idx: usize) -> usize {
    find_byte(bytes, idx, b'>')
        .map(|gt| gt + 1)
        .unwrap_or(bytes.len())
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_attr_name_end(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'=' | b'>' | b'/')
}

fn find_byte(bytes: &[u8], start: usize, needle: u8) -> Option<usize> {
    bytes
        .get(start..)?
        .iter()
        .position(|&b| b == needle)
        .map(|pos| start + pos)
}

fn find_subslice(bytes: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(start..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| start + pos)
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes.get(idx..).is_some_and(|rest| rest.starts_with(pattern))
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes
        .get(idx..idx + pattern.len())
        .is_some_and(|slice| slice.eq_ignore_ascii_case(pattern))
}
