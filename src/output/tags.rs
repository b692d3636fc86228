//! Tags cell encoding: a bracketed list literal such as `['love', 'life']`.
//!
//! Each tag is single-quoted unless it contains a single quote and no double
//! quote, in which case it is double-quoted. Backslashes, the active quote and
//! non-printable characters are escaped as `\xhh`, `\uhhhh` or `\Uhhhhhhhh`.
//! Non-printable means control characters, invisible format characters and
//! separators other than the ASCII space. Unassigned and private-use code
//! points are written as-is.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::ScrapeError;

pub fn encode(tags: &[String]) -> String {
    let items: Vec<String> = tags.iter().map(|t| quote(t)).collect();
    format!("[{}]", items.join(", "))
}

fn quote(tag: &str) -> String {
    let delim = if tag.contains('\'') && !tag.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(tag.len() + 2);
    out.push(delim);
    for c in tag.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => out.push_str(&escape_code_point(c)),
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !(c.is_control()
        || c.is_whitespace()
        || matches!(
            c,
            '\u{ad}'
                | '\u{600}'..='\u{605}'
                | '\u{61c}'
                | '\u{6dd}'
                | '\u{70f}'
                | '\u{180e}'
                | '\u{200b}'..='\u{200f}'
                | '\u{202a}'..='\u{202e}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
                | '\u{e0001}'
                | '\u{e0020}'..='\u{e007f}'
        ))
}

fn escape_code_point(c: char) -> String {
    match c as u32 {
        n @ 0..=0xff => format!("\\x{:02x}", n),
        n @ 0x100..=0xffff => format!("\\u{:04x}", n),
        n => format!("\\U{:08x}", n),
    }
}

/// Inverse of [`encode`].
pub fn decode(cell: &str) -> Result<Vec<String>, ScrapeError> {
    let invalid = || ScrapeError::InvalidTags(cell.to_string());

    let mut chars = cell.trim().chars().peekable();
    if chars.next() != Some('[') {
        return Err(invalid());
    }

    let mut tags = Vec::new();
    skip_ws(&mut chars);
    if chars.peek() == Some(&']') {
        chars.next();
        return finish(chars, tags).ok_or_else(invalid);
    }

    loop {
        skip_ws(&mut chars);
        tags.push(read_string(&mut chars).ok_or_else(invalid)?);
        skip_ws(&mut chars);
        match chars.next() {
            Some(',') => continue,
            Some(']') => return finish(chars, tags).ok_or_else(invalid),
            _ => return Err(invalid()),
        }
    }
}

fn finish(mut rest: Peekable<Chars<'_>>, tags: Vec<String>) -> Option<Vec<String>> {
    rest.next().is_none().then_some(tags)
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn read_string(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let delim = chars.next().filter(|c| *c == '\'' || *c == '"')?;
    let mut out = String::new();
    loop {
        match chars.next()? {
            c if c == delim => return Some(out),
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'x' => out.push(read_hex(chars, 2)?),
                'u' => out.push(read_hex(chars, 4)?),
                'U' => out.push(read_hex(chars, 8)?),
                c => out.push(c),
            },
            c => out.push(c),
        }
    }
}

fn read_hex(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<char> {
    let hex = (0..digits).map(|_| chars.next()).collect::<Option<String>>()?;
    char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
}
