//! Key path codec: `a.b[0].c` ⇄ `[Key(a), Key(b), Index(0), Key(c)]`.
//!
//! Key segments are separated by `.`, index segments are wrapped in `[n]`.
//! A key segment may never look like an unsigned integer, so `a.3` and `a[3]`
//! cannot both address the same slot.

use std::fmt;

use crate::error::ConfError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Key,
    Index,
}

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl PathSegment {
    pub fn key(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Key,
            text: text.into(),
        }
    }

    pub fn index(i: usize) -> Self {
        Self {
            kind: SegmentKind::Index,
            text: i.to_string(),
        }
    }

    pub fn is_index(&self) -> bool {
        self.kind == SegmentKind::Index
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SegmentKind::Key => f.write_str(&self.text),
            SegmentKind::Index => write!(f, "[{}]", self.text),
        }
    }
}

/// Split a key into its path segments.
pub fn split_path(key: &str) -> Result<Vec<PathSegment>, ConfError> {
    if key.is_empty() {
        return Err(ConfError::invalid_key(key, "key is empty"));
    }

    let mut path = Vec::new();
    let mut start = 0;
    let mut last: Option<char> = None;
    let mut in_bracket = false;

    for (i, c) in key.char_indices() {
        match c {
            c if c.is_whitespace() => {
                return Err(ConfError::invalid_key(key, "whitespace is not allowed"));
            }
            '.' => {
                if in_bracket {
                    return Err(ConfError::invalid_key(key, "'.' inside brackets"));
                }
                if last != Some(']') {
                    push_key(&mut path, key, &key[start..i])?;
                }
                start = i + 1;
            }
            '[' => {
                if in_bracket {
                    return Err(ConfError::invalid_key(key, "nested '['"));
                }
                if last == Some('.') {
                    return Err(ConfError::invalid_key(key, "'[' directly after '.'"));
                }
                // `[0]` may open a key; `a[0][1]` chains indexes.
                if i != 0 && last != Some(']') {
                    push_key(&mut path, key, &key[start..i])?;
                }
                in_bracket = true;
                start = i + 1;
            }
            ']' => {
                if !in_bracket {
                    return Err(ConfError::invalid_key(key, "unbalanced ']'"));
                }
                push_index(&mut path, key, &key[start..i])?;
                in_bracket = false;
                start = i + 1;
            }
            _ => {
                if last == Some(']') {
                    return Err(ConfError::invalid_key(
                        key,
                        "only '.' or '[' may follow ']'",
                    ));
                }
            }
        }
        last = Some(c);
    }

    if in_bracket {
        return Err(ConfError::invalid_key(key, "unbalanced '['"));
    }
    if last != Some(']') {
        push_key(&mut path, key, &key[start..])?;
    }
    Ok(path)
}

fn push_key(path: &mut Vec<PathSegment>, key: &str, text: &str) -> Result<(), ConfError> {
    if text.is_empty() {
        return Err(ConfError::invalid_key(key, "empty key segment"));
    }
    if text.parse::<u64>().is_ok() {
        return Err(ConfError::invalid_key(
            key,
            format!("key segment '{text}' looks like an index"),
        ));
    }
    path.push(PathSegment::key(text));
    Ok(())
}

fn push_index(path: &mut Vec<PathSegment>, key: &str, text: &str) -> Result<(), ConfError> {
    let canonical = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'));
    if !canonical || text.parse::<usize>().is_err() {
        return Err(ConfError::invalid_key(
            key,
            format!("'{text}' is not a valid index"),
        ));
    }
    path.push(PathSegment {
        kind: SegmentKind::Index,
        text: text.to_string(),
    });
    Ok(())
}

/// Join segments back into a canonical key.
pub fn join_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in path.iter().enumerate() {
        if seg.kind == SegmentKind::Key && i > 0 {
            out.push('.');
        }
        out.push_str(&seg.to_string());
    }
    out
}

/// Append a child key to `prefix`, with no separator when `prefix` is the root.
pub(crate) fn child_key(prefix: &str, child: &str) -> String {
    if prefix.is_empty() {
        child.to_string()
    } else {
        format!("{prefix}.{child}")
    }
}

pub(crate) fn index_key(prefix: &str, i: usize) -> String {
    format!("{prefix}[{i}]")
}

/// True when `key` equals `ancestor` or sits beneath it at a `.`/`[` boundary.
/// The empty key is the ancestor of everything.
pub(crate) fn is_within(key: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    match key.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}
