// Fan Launcher Implementation
// Copyright (c) 2024-2025 The Mapleseed Inc.
// Licensed under GPL-3.0 License

//! # Property Store
//!
//! Reader for the `config.props` format shared by every Fan runtime:
//!
//! - one `name = value` pair per line, whitespace around both trimmed
//! - `//` end-of-line comments and nestable `/* */` block comments
//! - escapes `\n`, `\r`, `\t`, `\\` and `\uXXXX`
//! - a backslash before a line terminator continues the entry on the next
//!   line, skipping that line's leading spaces and tabs
//!
//! Entries keep file order. Duplicate names are stored as-is; lookups return
//! the first match.

use std::{
    borrow::Cow,
    fmt,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use log::warn;
use thiserror::Error;

/// Kind of grammar violation found while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Non-empty text on a line without `=`, or an empty name before `=`
    InvalidNameValue,
    /// Backslash followed by an unsupported character
    InvalidEscape,
    /// `\u` not followed by four hex digits naming a valid character
    InvalidUnicodeEscape,
    /// Backslash as the last character of the input
    UnterminatedEscape,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SyntaxErrorKind::InvalidNameValue => "Invalid name/value pair",
            SyntaxErrorKind::InvalidEscape => "Invalid escape sequence",
            SyntaxErrorKind::InvalidUnicodeEscape => "Invalid hex value for \\uxxxx",
            SyntaxErrorKind::UnterminatedEscape => "Unterminated escape sequence",
        };
        f.write_str(msg)
    }
}

/// Errors produced while loading a property resource
#[derive(Error, Debug)]
pub enum PropsError {
    #[error("File not found [{}]", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{kind} [{origin}:{line}]")]
    Syntax {
        origin: String,
        line: usize,
        kind: SyntaxErrorKind,
    },
}

impl PropsError {
    /// Whether the resource itself was missing or unreadable
    pub fn is_not_found(&self) -> bool {
        matches!(self, PropsError::NotFound { .. })
    }
}

/// Props files are byte oriented; bytes that are not UTF-8 become U+FFFD.
fn decode<'a>(bytes: &'a [u8], origin: &str) -> Cow<'a, str> {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        warn!("Invalid UTF-8 in {}, bad bytes replaced", origin);
    }
    text
}

/// A single `name = value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    pub name: String,
    pub value: String,
}

/// Ordered property list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Props {
    entries: Vec<Prop>,
}

impl Props {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Read and parse the file at `path`.
    ///
    /// The file handle is released before parsing starts, so it is closed on
    /// every path including syntax errors.
    pub fn load(path: &Path) -> Result<Props, PropsError> {
        let bytes = fs::read(path).map_err(|source| PropsError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        Props::parse_str(&decode(&bytes, &origin), &origin)
    }

    /// Parse everything readable from `reader`. `origin` names the source in
    /// error messages.
    pub fn parse_reader<R: Read>(mut reader: R, origin: &str) -> Result<Props, PropsError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| PropsError::NotFound {
                path: PathBuf::from(origin),
                source,
            })?;
        Props::parse_str(&decode(&bytes, origin), origin)
    }

    /// Parse props text. `origin` names the source in error messages.
    pub fn parse_str(source: &str, origin: &str) -> Result<Props, PropsError> {
        Parser::new(source, origin).parse()
    }

    /// Value of the first entry called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Overwrite the first entry called `name`, or append a new one.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|p| p.name == name) {
            Some(prop) => prop.value = value.to_string(),
            None => self.entries.push(Prop {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Props {
    type Item = &'a Prop;
    type IntoIter = std::slice::Iter<'a, Prop>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Character cursor with a single slot of pushback
struct CharStream<I: Iterator<Item = char>> {
    chars: I,
    pushback: Option<char>,
}

impl<I: Iterator<Item = char>> CharStream<I> {
    fn new(chars: I) -> Self {
        Self { chars, pushback: None }
    }

    fn read(&mut self) -> Option<char> {
        self.pushback.take().or_else(|| self.chars.next())
    }

    fn unread(&mut self, c: char) {
        debug_assert!(self.pushback.is_none(), "pushback slot already in use");
        self.pushback = Some(c);
    }
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn trim(s: &str) -> &str {
    s.trim_matches(is_space)
}

struct Parser<'a> {
    stream: CharStream<std::str::Chars<'a>>,
    origin: &'a str,
    line: usize,
    name: String,
    value: String,
    in_value: bool,
    block_depth: usize,
    in_line_comment: bool,
    after_cr: bool,
    props: Props,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, origin: &'a str) -> Self {
        Self {
            stream: CharStream::new(source.chars()),
            origin,
            line: 1,
            name: String::new(),
            value: String::new(),
            in_value: false,
            block_depth: 0,
            in_line_comment: false,
            after_cr: false,
            props: Props::new(),
        }
    }

    fn error(&self, kind: SyntaxErrorKind) -> PropsError {
        PropsError::Syntax {
            origin: self.origin.to_string(),
            line: self.line,
            kind,
        }
    }

    fn parse(mut self) -> Result<Props, PropsError> {
        while let Some(c) = self.stream.read() {
            let after_cr = std::mem::replace(&mut self.after_cr, false);

            if c == '\n' || c == '\r' {
                // \r\n is one terminator
                if after_cr && c == '\n' {
                    continue;
                }
                self.after_cr = c == '\r';
                self.in_line_comment = false;
                self.end_entry()?;
                self.line += 1;
                continue;
            }

            if self.in_line_comment {
                continue;
            }

            if self.block_depth > 0 {
                self.block_comment_char(c);
                continue;
            }

            if c == '=' && !self.in_value {
                self.in_value = true;
                continue;
            }

            if c == '/' {
                match self.stream.read() {
                    Some('/') => {
                        self.in_line_comment = true;
                        continue;
                    }
                    Some('*') => {
                        self.block_depth += 1;
                        continue;
                    }
                    Some(peek) => self.stream.unread(peek),
                    None => {}
                }
            }

            let c = if c == '\\' {
                match self.escape()? {
                    Some(decoded) => decoded,
                    None => continue,
                }
            } else {
                c
            };

            if self.in_value {
                self.value.push(c);
            } else {
                self.name.push(c);
            }
        }

        self.end_entry()?;
        Ok(self.props)
    }

    /// Track nesting inside `/* */`; everything else in the comment is skipped.
    fn block_comment_char(&mut self, c: char) {
        let closing = match c {
            '/' => '*',
            '*' => '/',
            _ => return,
        };
        match self.stream.read() {
            Some(peek) if peek == closing => {
                if c == '/' {
                    self.block_depth += 1;
                } else {
                    self.block_depth -= 1;
                }
            }
            Some(peek) => self.stream.unread(peek),
            None => {}
        }
    }

    /// Decode the sequence after a backslash. `None` means a line
    /// continuation that contributes no character.
    fn escape(&mut self) -> Result<Option<char>, PropsError> {
        let peek = self
            .stream
            .read()
            .ok_or_else(|| self.error(SyntaxErrorKind::UnterminatedEscape))?;
        let decoded = match peek {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '\r' | '\n' => {
                self.continue_line(peek);
                return Ok(None);
            }
            'u' => self.unicode_escape()?,
            _ => return Err(self.error(SyntaxErrorKind::InvalidEscape)),
        };
        Ok(Some(decoded))
    }

    fn continue_line(&mut self, terminator: char) {
        self.line += 1;
        if terminator == '\r' {
            match self.stream.read() {
                Some('\n') | None => {}
                Some(other) => self.stream.unread(other),
            }
        }
        while let Some(c) = self.stream.read() {
            if !is_space(c) {
                self.stream.unread(c);
                break;
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, PropsError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .stream
                .read()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(SyntaxErrorKind::InvalidUnicodeEscape))?;
            code = (code << 4) | digit;
        }
        char::from_u32(code).ok_or_else(|| self.error(SyntaxErrorKind::InvalidUnicodeEscape))
    }

    fn end_entry(&mut self) -> Result<(), PropsError> {
        let name = trim(&self.name);
        if self.in_value {
            if name.is_empty() {
                return Err(self.error(SyntaxErrorKind::InvalidNameValue));
            }
            self.props.entries.push(Prop {
                name: name.to_string(),
                value: trim(&self.value).to_string(),
            });
        } else if !name.is_empty() {
            return Err(self.error(SyntaxErrorKind::InvalidNameValue));
        }
        self.name.clear();
        self.value.clear();
        self.in_value = false;
        Ok(())
    }
}
