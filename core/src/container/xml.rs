//! container/xml.rs
//! String-level XML editing for OOXML parts.
//!
//! Only what the adapters need: locate a start tag by qualified name, read and
//! set one attribute, read and replace the text of a simple element. Every
//! edit leaves the rest of the part byte-for-byte unchanged.

use std::ops::Range;

/// Escape for attribute values and text nodes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve the five predefined entities and numeric character references.
/// Unknown entities are kept verbatim.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
            }
            _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

/// Byte range of a start tag, `<` through `>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    pub self_closing: bool,
}

impl TagSpan {
    pub fn as_str<'a>(&self, xml: &'a str) -> &'a str {
        &xml[self.start..self.end]
    }
}

/// First start tag named exactly `name` at or after `from`.
pub fn find_start_tag(xml: &str, name: &str, from: usize) -> Option<TagSpan> {
    let needle = format!("<{name}");
    let mut pos = from;
    while let Some(rel) = xml.get(pos..)?.find(&needle) {
        let start = pos + rel;
        let after = start + needle.len();
        match xml[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {
                let end = tag_end(xml, after)?;
                let self_closing = xml[..end - 1].ends_with('/');
                return Some(TagSpan { start, end, self_closing });
            }
            _ => pos = after,
        }
    }
    None
}

/// Every start tag named `name`, in document order.
pub fn find_all_start_tags(xml: &str, name: &str) -> Vec<TagSpan> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(tag) = find_start_tag(xml, name, pos) {
        pos = tag.end;
        out.push(tag);
    }
    out
}

/// Index one past the `>` closing a tag, skipping quoted attribute values.
fn tag_end(xml: &str, from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in xml[from..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(from + i + 1),
            _ => {}
        }
    }
    None
}

/// Value range (between the quotes) of attribute `attr` inside a start tag.
fn attr_value_range(tag: &str, attr: &str) -> Option<Range<usize>> {
    let bytes = tag.as_bytes();
    let mut i = tag.find(|c: char| c.is_whitespace())?;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
            i += 1;
        }
        let name = &tag[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            if name.is_empty() {
                i += 1;
            }
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let q = *bytes.get(i)?;
        if q != b'"' && q != b'\'' {
            return None;
        }
        let value_start = i + 1;
        let value_end = value_start + tag[value_start..].find(q as char)?;
        if name == attr {
            return Some(value_start..value_end);
        }
        i = value_end + 1;
    }
    None
}

/// Unescaped value of `attr` in a start tag.
pub fn tag_attr(tag: &str, attr: &str) -> Option<String> {
    attr_value_range(tag, attr).map(|r| unescape(&tag[r]))
}

/// The start tag with `attr` set to `value` (replaced if present, appended otherwise).
pub fn with_attr(tag: &str, attr: &str, value: &str) -> String {
    let escaped = escape(value);
    if let Some(r) = attr_value_range(tag, attr) {
        return format!("{}{}{}", &tag[..r.start], escaped, &tag[r.end..]);
    }
    let close = if tag.ends_with("/>") { tag.len() - 2 } else { tag.len() - 1 };
    let head = tag[..close].trim_end();
    format!("{} {}=\"{}\"{}", head, attr, escaped, &tag[close..])
}

/// Set `attr` on the tag at `span`, returning the edited document.
pub fn set_attr_at(xml: &str, span: TagSpan, attr: &str, value: &str) -> String {
    let tag = with_attr(span.as_str(xml), attr, value);
    format!("{}{}{}", &xml[..span.start], tag, &xml[span.end..])
}

/// Range of the content of the first `name` element at or after `from`.
/// A self-closing element yields an empty range at the tag end.
fn content_range(xml: &str, name: &str, from: usize) -> Option<(TagSpan, Range<usize>)> {
    let open = find_start_tag(xml, name, from)?;
    if open.self_closing {
        return Some((open, open.end..open.end));
    }
    let close = format!("</{name}>");
    let end = open.end + xml[open.end..].find(&close)?;
    Some((open, open.end..end))
}

/// Unescaped text of the first `name` element.
pub fn element_text(xml: &str, name: &str) -> Option<String> {
    content_range(xml, name, 0).map(|(_, r)| unescape(&xml[r]))
}

/// Byte range of the raw inner markup of the first `name` element at or after `from`,
/// plus the offset just past it.
pub fn element_inner(xml: &str, name: &str, from: usize) -> Option<(Range<usize>, usize)> {
    let (open, r) = content_range(xml, name, from)?;
    let after = if open.self_closing { open.end } else { r.end + name.len() + 3 };
    Some((r, after))
}

/// Replace the text of the first `name` element. `None` when the element is missing.
pub fn set_element_text(xml: &str, name: &str, text: &str) -> Option<String> {
    let (open, r) = content_range(xml, name, 0)?;
    if open.self_closing {
        let tag = open.as_str(xml);
        let opened = format!("{}>", tag[..tag.len() - 2].trim_end());
        return Some(format!(
            "{}{}{}</{}>{}",
            &xml[..open.start],
            opened,
            escape(text),
            name,
            &xml[open.end..]
        ));
    }
    Some(format!("{}{}{}", &xml[..r.start], escape(text), &xml[r.end..]))
}

/// Insert `fragment` right before the first `close_tag`.
pub fn insert_before(xml: &str, close_tag: &str, fragment: &str) -> Option<String> {
    let at = xml.find(close_tag)?;
    Some(format!("{}{}{}", &xml[..at], fragment, &xml[at..]))
}
