//! Path and query rewriting
//!
//! Docker Hub treats a repository name without a namespace as
//! `library/<name>`. Clients rely on that implicitly, so requests that
//! omit the namespace are patched here before they go upstream.
//!
//! Both fixes are textual patches over the raw request target, not
//! structural parses. Their trigger conditions must not be widened.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::target::Target;

const ENCODED_COLON: &str = "%3A";
const ENCODED_SLASH: &str = "%2F";
const ENCODED_LIBRARY: &str = "library%2F";

/// Path plus optional raw query of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub path: String,
    pub query: Option<String>,
}

impl RequestTarget {
    pub fn new(path: impl Into<String>, query: Option<impl Into<String>>) -> Self {
        Self {
            path: path.into(),
            query: query.map(Into::into),
        }
    }

    /// Path and query of a parsed URL, dot segments already resolved
    pub fn from_url(url: &Url) -> Self {
        Self::new(url.path(), url.query())
    }

    /// Split a `path?query` string at the first `?`
    pub fn parse(target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self::new(path, Some(query)),
            None => Self::new(target, None::<String>),
        }
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Insert the implicit namespace into a query-encoded repository reference
///
/// Applies when the query has no encoded slash (`%2F`) and the target
/// contains an encoded colon (`%3A`). The first `%3A` that has an `&`
/// anywhere after it gets `library%2F` appended, so
/// `scope=repository%3Aalpine%3Apull&service=x` reads
/// `scope=repository%3Alibrary%2Falpine%3Apull&service=x`.
///
/// Edge cases, all left unchanged:
/// - no `%3A` followed later by `&` (e.g. the scope is the last parameter)
/// - lowercase `%3a` / `%2f`, which are not matched
///
/// Only the first qualifying `%3A` is patched, even if several exist.
pub fn fix_query_namespace(target: &str) -> Cow<'_, str> {
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or_default();
    if query.contains(ENCODED_SLASH) || !target.contains(ENCODED_COLON) {
        return Cow::Borrowed(target);
    }

    let Some(last_amp) = target.rfind('&') else {
        return Cow::Borrowed(target);
    };
    let insert_at = target
        .match_indices(ENCODED_COLON)
        .map(|(idx, _)| idx + ENCODED_COLON.len())
        .find(|&end| end <= last_amp);

    match insert_at {
        Some(at) => {
            let mut patched = String::with_capacity(target.len() + ENCODED_LIBRARY.len());
            patched.push_str(&target[..at]);
            patched.push_str(ENCODED_LIBRARY);
            patched.push_str(&target[at..]);
            Cow::Owned(patched)
        }
        None => Cow::Borrowed(target),
    }
}

/// Insert the implicit namespace into a top-level Docker Hub API path
///
/// Only for Docker Hub. `/v2/<name>/<kind>/<ref>` (exactly three
/// non-empty segments after `/v2/`) becomes `/v2/library/<name>/<kind>/<ref>`.
/// Paths already starting with `/v2/library` are left alone.
pub fn fix_path_namespace<'a>(path: &'a str, target: &Target) -> Cow<'a, str> {
    if !target.is_docker_hub() || path.starts_with("/v2/library") {
        return Cow::Borrowed(path);
    }

    let Some(rest) = path.strip_prefix("/v2/") else {
        return Cow::Borrowed(path);
    };
    let mut segments = rest.split('/');
    let three_segments = segments.by_ref().take(3).filter(|s| !s.is_empty()).count() == 3
        && segments.next().is_none();

    if three_segments {
        Cow::Owned(format!("/v2/library/{rest}"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Apply the query fix, then the path fix against the resulting path
pub fn rewrite_request_target(request: &RequestTarget, target: &Target) -> RequestTarget {
    let raw = request.to_string();
    let patched = RequestTarget::parse(&fix_query_namespace(&raw));
    let path = fix_path_namespace(&patched.path, target).into_owned();

    RequestTarget {
        path,
        query: patched.query,
    }
}
