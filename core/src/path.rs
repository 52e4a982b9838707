//! Escaped, parameterized endpoint paths.
//!
//! # Design
//! Endpoint paths embed caller-controlled identifiers (lobby IDs, user IDs).
//! Each parameter is percent-escaped on its own before it is substituted
//! into a trusted `&'static str` template, so a crafted ID containing `/`,
//! `?` or `#` can never change which route the request hits.
//!
//! Templates use positional placeholders `{0}`, `{1}`, `{2}`. Parameters are
//! passed as a tuple of at most three strings; there is no `PathParams` impl
//! for larger tuples.

use std::borrow::Cow;
use std::fmt;

use crate::error::{ApiError, ApiResult};

/// An endpoint path whose parameters have all been escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedPath(String);

impl ValidatedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ValidatedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Positional path parameters: `()`, `(a,)`, `(a, b)` or `(a, b, c)`.
pub trait PathParams: sealed::Sealed {
    fn escaped(&self) -> Vec<Cow<'_, str>>;
}

impl sealed::Sealed for () {}

impl PathParams for () {
    fn escaped(&self) -> Vec<Cow<'_, str>> {
        Vec::new()
    }
}

impl<A: AsRef<str>> sealed::Sealed for (A,) {}

impl<A: AsRef<str>> PathParams for (A,) {
    fn escaped(&self) -> Vec<Cow<'_, str>> {
        vec![escape(self.0.as_ref())]
    }
}

impl<A: AsRef<str>, B: AsRef<str>> sealed::Sealed for (A, B) {}

impl<A: AsRef<str>, B: AsRef<str>> PathParams for (A, B) {
    fn escaped(&self) -> Vec<Cow<'_, str>> {
        vec![escape(self.0.as_ref()), escape(self.1.as_ref())]
    }
}

impl<A: AsRef<str>, B: AsRef<str>, C: AsRef<str>> sealed::Sealed for (A, B, C) {}

impl<A: AsRef<str>, B: AsRef<str>, C: AsRef<str>> PathParams for (A, B, C) {
    fn escaped(&self) -> Vec<Cow<'_, str>> {
        vec![
            escape(self.0.as_ref()),
            escape(self.1.as_ref()),
            escape(self.2.as_ref()),
        ]
    }
}

/// Percent-escape everything outside the RFC 3986 unreserved set.
/// Borrows when nothing needs escaping.
fn escape(param: &str) -> Cow<'_, str> {
    urlencoding::encode(param)
}

/// Substitute escaped `params` into `template`.
///
/// Fails with `InvalidPath` if a placeholder is malformed, refers to a
/// parameter that was not supplied, or a supplied parameter is never used.
pub fn format_path(template: &'static str, params: impl PathParams) -> ApiResult<ValidatedPath> {
    let escaped = params.escaped();
    let invalid = |reason: String| ApiError::InvalidPath { template, reason };

    let mut used = vec![false; escaped.len()];
    let mut out = String::with_capacity(template.len() + escaped.iter().map(|p| p.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(invalid(format!("unmatched '}}' at byte {}", template.len() - rest.len() + open)));
        }
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| invalid("unterminated placeholder".to_string()))?;
        let index: usize = after[..close]
            .parse()
            .map_err(|_| invalid(format!("placeholder {{{}}} is not a parameter index", &after[..close])))?;
        let param = escaped
            .get(index)
            .ok_or_else(|| invalid(format!("placeholder {{{index}}} has no parameter ({} supplied)", escaped.len())))?;
        out.push_str(param);
        used[index] = true;
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(invalid(format!("parameter {unused} is never used")));
    }

    Ok(ValidatedPath(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY: [&str; 8] = [
        "plain",
        "a/b",
        "with space",
        "what?",
        "#hash",
        "../../admin",
        "100%",
        "ünïcødé",
    ];

    fn decode_segments(path: &ValidatedPath) -> Vec<String> {
        path.as_str()
            .split('/')
            .map(|segment| urlencoding::decode(segment).unwrap().into_owned())
            .collect()
    }

    #[test]
    fn no_parameters_leaves_template_untouched() {
        let path = format_path("lobbies/joined", ()).unwrap();
        assert_eq!(path.as_str(), "lobbies/joined");
    }

    #[test]
    fn one_parameter_roundtrips() {
        for id in TRICKY {
            let path = format_path("lobbies/{0}", (id,)).unwrap();
            assert_eq!(decode_segments(&path), vec!["lobbies".to_string(), id.to_string()]);
        }
    }

    #[test]
    fn two_parameters_are_escaped_independently() {
        for a in TRICKY {
            for b in TRICKY {
                let path = format_path("lobbies/{0}/members/{1}", (a, b)).unwrap();
                assert_eq!(path.as_str().split('/').count(), 4, "{path}");
                assert_eq!(decode_segments(&path), vec!["lobbies", a, "members", b]);
            }
        }
    }

    #[test]
    fn three_parameters_roundtrip() {
        let (a, b, c) = ("x/y", "a b", "q?#");
        let path = format_path("{0}/{1}/{2}", (a, b, c)).unwrap();
        assert_eq!(path.as_str(), "x%2Fy/a%20b/q%3F%23");
        assert_eq!(decode_segments(&path), vec![a, b, c]);
    }

    #[test]
    fn parameters_can_be_reordered() {
        let path = format_path("{1}/{0}", ("first", "second")).unwrap();
        assert_eq!(path.as_str(), "second/first");
    }

    #[test]
    fn unreserved_characters_are_kept() {
        let path = format_path("users/{0}", ("Az09-_.~",)).unwrap();
        assert_eq!(path.as_str(), "users/Az09-_.~");
    }

    #[test]
    fn owned_strings_are_accepted() {
        let id = String::from("L 1");
        let path = format_path("lobbies/{0}", (&id,)).unwrap();
        assert_eq!(path.as_str(), "lobbies/L%201");
    }

    #[test]
    fn missing_parameter_is_fatal() {
        let err = format_path("lobbies/{1}", ("only",)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidPath { template: "lobbies/{1}", .. }));
    }

    #[test]
    fn unused_parameter_is_fatal() {
        assert!(matches!(
            format_path("lobbies", ("extra",)),
            Err(ApiError::InvalidPath { .. })
        ));
    }

    #[test]
    fn malformed_placeholders_are_fatal() {
        assert!(format_path("lobbies/{0", ("a",)).is_err());
        assert!(format_path("lobbies/{x}", ("a",)).is_err());
        assert!(format_path("lobbies/0}", ()).is_err());
    }
}
