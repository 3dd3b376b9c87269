//! Placeholder resolution: substitute `${key:=default}` references inside a
//! string with values from a [`Properties`].
//!
//! References are matched by balanced-brace scanning, so defaults may nest
//! further references (`${a:=${b:=c}}`). Resolved values are themselves
//! resolved, which lets one property point at another. A property that
//! (directly or indirectly) references itself recurses without bound; there is
//! no cycle detection.

use crate::error::ConfError;
use crate::store::Properties;
use crate::tag::ParsedTag;

/// Resolve every placeholder in `s`, left to right.
pub fn resolve_string(props: &Properties, s: &str) -> Result<String, ConfError> {
    let Some(start) = s.find("${") else {
        return Ok(s.to_string());
    };
    let end = matching_brace(s, start)?;

    let tag = ParsedTag::parse(&s[start..=end])?;
    let value = resolve_tag(props, &tag)?;
    let rest = resolve_string(props, &s[end + 1..])?;

    let mut out = String::with_capacity(start + value.len() + rest.len());
    out.push_str(&s[..start]);
    out.push_str(&value);
    out.push_str(&rest);
    Ok(out)
}

/// Look up the value a tag refers to.
///
/// 1. A stored leaf is resolved recursively.
/// 2. A key that only names a subtree is not a simple value.
/// 3. Otherwise the default (if any) is resolved.
/// 4. Otherwise the key does not exist.
pub fn resolve_tag(props: &Properties, tag: &ParsedTag) -> Result<String, ConfError> {
    resolve_key(props, &tag.key, tag.has_default.then_some(tag.default.as_str()))
}

/// [`resolve_tag`] for an already-absolute key.
pub(crate) fn resolve_key(
    props: &Properties,
    key: &str,
    default: Option<&str>,
) -> Result<String, ConfError> {
    if !key.is_empty() {
        if let Some(value) = props.leaf(key) {
            return resolve_string(props, value);
        }
        if props.has(key) {
            return Err(ConfError::NotSimpleValue {
                key: key.to_string(),
            });
        }
    }
    match default {
        Some(default) => resolve_string(props, default),
        None => Err(ConfError::NotExist {
            key: key.to_string(),
        }),
    }
}

/// Byte index of the `}` closing the `${` at `start`.
fn matching_brace(s: &str, start: usize) -> Result<usize, ConfError> {
    let bytes = s.as_bytes();
    let mut depth = 1;
    let mut i = start + 2;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ConfError::syntax(s, "unbalanced '${'"))
}
