//! The binding tag mini-language: `${key:=default}>>splitter`.
//!
//! - `key` is a dotted/bracketed property path; `ROOT` stands for the empty key.
//! - `:=default` is optional and may itself contain placeholders.
//! - `>>splitter` names a registered splitter used when a list is bound from a
//!   single delimited string.

use std::fmt;

use crate::error::ConfError;

/// Reserved key meaning "the enclosing key itself".
pub const ROOT_KEY: &str = "ROOT";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTag {
    pub key: String,
    pub default: String,
    pub has_default: bool,
    pub splitter: String,
}

impl ParsedTag {
    /// Parse a tag.
    ///
    /// The closing `}` is the *last* `}` in the text and the opener is the
    /// *first* `${`, so defaults may nest placeholders. A `>>` only marks a
    /// splitter when it comes after the closing brace.
    ///
    /// The key and splitter name are trimmed. The default is kept verbatim, so
    /// `${sep:= }` defaults to a single space.
    pub fn parse(tag: &str) -> Result<Self, ConfError> {
        let close = tag
            .rfind('}')
            .ok_or_else(|| ConfError::syntax(tag, "missing '}'"))?;
        let open = tag
            .find("${")
            .ok_or_else(|| ConfError::syntax(tag, "missing '${'"))?;
        if open > close {
            return Err(ConfError::syntax(tag, "'}' before '${'"));
        }
        if !tag[..open].trim().is_empty() {
            return Err(ConfError::syntax(tag, "text before '${'"));
        }

        let mut splitter = String::new();
        let tail = &tag[close + 1..];
        match tag.rfind(">>") {
            Some(0) => return Err(ConfError::syntax(tag, "'>>' at start of tag")),
            Some(pos) if pos > close => {
                if !tag[close + 1..pos].trim().is_empty() {
                    return Err(ConfError::syntax(tag, "text between '}' and '>>'"));
                }
                splitter = tag[pos + 2..].trim().to_string();
                if splitter.is_empty() {
                    return Err(ConfError::syntax(tag, "empty splitter name"));
                }
            }
            _ => {
                if !tail.trim().is_empty() {
                    return Err(ConfError::syntax(tag, "text after '}'"));
                }
            }
        }

        let body = &tag[open + 2..close];
        let (key, default) = match body.split_once(":=") {
            Some((k, d)) => (k.trim(), Some(d)),
            None => (body.trim(), None),
        };
        if key.is_empty() && default.is_none() {
            return Err(ConfError::syntax(tag, "key is required without a default"));
        }

        Ok(ParsedTag {
            key: if key == ROOT_KEY { String::new() } else { key.to_string() },
            default: default.unwrap_or_default().to_string(),
            has_default: default.is_some(),
            splitter,
        })
    }
}

impl fmt::Display for ParsedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.key.is_empty() && !self.has_default {
            ROOT_KEY
        } else {
            &self.key
        };
        write!(f, "${{{key}")?;
        if self.has_default {
            write!(f, ":={}", self.default)?;
        }
        f.write_str("}")?;
        if !self.splitter.is_empty() {
            write!(f, ">>{}", self.splitter)?;
        }
        Ok(())
    }
}

/// Everything needed to bind one target: where its value lives and how to
/// report errors about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindParam {
    /// Absolute dotted key.
    pub key: String,
    /// Human-readable location, e.g. `Server.tls.cert`.
    pub path: String,
    pub tag: ParsedTag,
    /// Validation expression handed to the registered validator.
    pub validate: Option<String>,
}

impl BindParam {
    /// A root param with the given display path.
    pub fn root(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse `tag` and descend into it from this param's key.
    pub fn bind_tag(&self, tag: &str, validate: Option<&str>) -> Result<Self, ConfError> {
        let parsed = ParsedTag::parse(tag)?;
        let key = if self.key.is_empty() {
            parsed.key.clone()
        } else if parsed.key.is_empty() {
            self.key.clone()
        } else {
            format!("{}.{}", self.key, parsed.key)
        };
        Ok(Self {
            key,
            path: self.path.clone(),
            tag: parsed,
            validate: validate.map(str::to_string),
        })
    }

    /// Same param with `segment` appended to the display path.
    pub fn at(mut self, segment: &str) -> Self {
        if self.path.is_empty() {
            self.path = segment.to_string();
        } else if segment.starts_with('[') {
            self.path.push_str(segment);
        } else {
            self.path.push('.');
            self.path.push_str(segment);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tag: &str) -> ParsedTag {
        ParsedTag::parse(tag).unwrap()
    }

    #[test]
    fn key_only() {
        let t = parse("${server.port}");
        assert_eq!(t.key, "server.port");
        assert!(!t.has_default);
        assert!(t.splitter.is_empty());
    }

    #[test]
    fn key_and_default() {
        let t = parse("${port:=8080}");
        assert_eq!(t.key, "port");
        assert_eq!(t.default, "8080");
        assert!(t.has_default);
    }

    #[test]
    fn empty_default_is_still_a_default() {
        let t = parse("${list:=}");
        assert!(t.has_default);
        assert_eq!(t.default, "");
    }

    #[test]
    fn default_keeps_surrounding_whitespace() {
        let t = parse("${ sep := , }");
        assert_eq!(t.key, "sep");
        assert_eq!(t.default, " , ");
    }

    #[test]
    fn nested_default() {
        let t = parse("${a:=${b:=C}}");
        assert_eq!(t.key, "a");
        assert_eq!(t.default, "${b:=C}");
    }

    #[test]
    fn splitter_after_brace() {
        let t = parse("${hosts:=a;b}>>semicolon");
        assert_eq!(t.key, "hosts");
        assert_eq!(t.default, "a;b");
        assert_eq!(t.splitter, "semicolon");
    }

    #[test]
    fn arrows_inside_default_are_not_a_splitter() {
        let t = parse("${cmd:=a>>b}");
        assert_eq!(t.default, "a>>b");
        assert!(t.splitter.is_empty());
    }

    #[test]
    fn root_maps_to_empty_key() {
        let t = parse("${ROOT}");
        assert_eq!(t.key, "");
        assert!(!t.has_default);
    }

    #[test]
    fn default_only() {
        let t = parse("${:=fallback}");
        assert_eq!(t.key, "");
        assert_eq!(t.default, "fallback");
    }

    #[test]
    fn rejects_bad_syntax() {
        for bad in [
            "", "port", "${port", "port}", "}${port", ">>${a}", "${}", "x${a}", "${a}x",
            "${a}>>", "${a} x >>s",
        ] {
            assert!(
                matches!(ParsedTag::parse(bad), Err(ConfError::InvalidSyntax { .. })),
                "expected InvalidSyntax for {bad:?}"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for tag in ["${a}", "${a:=1}", "${a:=}>>csv", "${ROOT}", "${:=x}"] {
            assert_eq!(parse(tag).to_string(), tag);
        }
    }

    #[test]
    fn bind_tag_composes_keys() {
        let root = BindParam::root("App");
        let server = root.bind_tag("${server}", None).unwrap();
        assert_eq!(server.key, "server");

        let port = server.bind_tag("${port:=80}", Some("$>0")).unwrap();
        assert_eq!(port.key, "server.port");
        assert_eq!(port.validate.as_deref(), Some("$>0"));

        let same = server.bind_tag("${ROOT}", None).unwrap();
        assert_eq!(same.key, "server");

        let from_root = root.bind_tag("${ROOT}", None).unwrap();
        assert_eq!(from_root.key, "");
    }

    #[test]
    fn at_extends_path() {
        let p = BindParam::root("App").at("servers").at("[0]").at("host");
        assert_eq!(p.path, "App.servers[0].host");
        assert_eq!(BindParam::default().at("x").path, "x");
    }
}
