//! Action/method/parameter decomposition of a request path.
//!
//! Pure string computation over two caller-supplied predicates; no registry
//! access, no I/O.

use smallvec::SmallVec;

/// Method used when the path names no method, and action used for an empty path.
pub const DEFAULT_METHOD: &str = "index";

/// Reserved method keyword. Always accepted as a method-start, whatever the
/// handler exposes; proxies answer it with their method list.
pub const METHOD_NAMES_KEY: &str = "methodNames";

/// Trailing parameters stay inline up to this count.
pub const MAX_INLINE_PARAMS: usize = 8;

pub type ParamVec = SmallVec<[String; MAX_INLINE_PARAMS]>;

/// Result of parsing one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Registry key, possibly spanning several segments (`admin/user`).
    pub action: String,
    /// Method to invoke on the action's proxy.
    pub method_start: String,
    /// Segments after the method, in path order.
    pub params: ParamVec,
}

impl Route {
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// Split `path` into action, method-start and parameters.
///
/// Segments are accumulated left to right; the prefix becomes the action the
/// first time `action_exists` accepts it. When no prefix is accepted the first
/// segment is taken as the action so the caller can report it. The next
/// segment is the method-start only if `is_method_start(action, segment)` holds
/// or it equals [`METHOD_NAMES_KEY`]; otherwise the method is
/// [`DEFAULT_METHOD`] and that segment opens the parameter list.
pub fn parse_url<A, M>(path: &str, action_exists: A, is_method_start: M) -> Route
where
    A: Fn(&str) -> bool,
    M: Fn(&str, &str) -> bool,
{
    let segments: SmallVec<[&str; 16]> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return Route {
            action: DEFAULT_METHOD.to_string(),
            method_start: DEFAULT_METHOD.to_string(),
            params: ParamVec::new(),
        };
    }

    let mut prefix = String::with_capacity(path.len());
    let mut action_len = None;
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            prefix.push('/');
        }
        prefix.push_str(segment);
        if action_exists(prefix.as_str()) {
            action_len = Some(i + 1);
            break;
        }
    }

    let (action, rest) = match action_len {
        Some(n) => (prefix, &segments[n..]),
        None => (segments[0].to_string(), &segments[1..]),
    };

    let (method_start, params) = match rest.split_first() {
        Some((first, tail))
            if *first == METHOD_NAMES_KEY || is_method_start(action.as_str(), *first) =>
        {
            ((*first).to_string(), tail)
        }
        _ => (DEFAULT_METHOD.to_string(), rest),
    };

    Route {
        action,
        method_start,
        params: params.iter().map(|s| (*s).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(name: &str) -> bool {
        matches!(name, "user" | "report" | "admin/user")
    }

    fn methods(action: &str, method: &str) -> bool {
        matches!(
            (action, method),
            ("user", "login") | ("user", "logout") | ("report", "view") | ("admin/user", "list")
        )
    }

    fn parse(path: &str) -> Route {
        parse_url(path, actions, methods)
    }

    #[test]
    fn test_action_and_method() {
        let route = parse("/user/login");
        assert_eq!(route.action, "user");
        assert_eq!(route.method_start, "login");
        assert!(route.params.is_empty());
    }

    #[test]
    fn test_trailing_params_in_order() {
        let route = parse("/report/view/2024/10");
        assert_eq!(route.action, "report");
        assert_eq!(route.method_start, "view");
        assert_eq!(route.params.as_slice(), ["2024", "10"]);
        assert_eq!(route.param(1), Some("10"));
    }

    #[test]
    fn test_missing_method_defaults_to_index() {
        let route = parse("/user");
        assert_eq!(route.method_start, DEFAULT_METHOD);
        assert!(route.params.is_empty());
    }

    #[test]
    fn test_unknown_method_segment_becomes_param() {
        let route = parse("/user/42/login");
        assert_eq!(route.action, "user");
        assert_eq!(route.method_start, DEFAULT_METHOD);
        // "login" after a parameter is never reinterpreted as the method
        assert_eq!(route.params.as_slice(), ["42", "login"]);
    }

    #[test]
    fn test_multi_segment_action() {
        let route = parse("/admin/user/list/active");
        assert_eq!(route.action, "admin/user");
        assert_eq!(route.method_start, "list");
        assert_eq!(route.params.as_slice(), ["active"]);
    }

    #[test]
    fn test_first_accepted_prefix_wins() {
        let route = parse_url("/admin/user/list", |a| a == "admin" || a == "admin/user", |_, _| false);
        assert_eq!(route.action, "admin");
        assert_eq!(route.method_start, DEFAULT_METHOD);
        assert_eq!(route.params.as_slice(), ["user", "list"]);
    }

    #[test]
    fn test_reserved_keyword_always_method_start() {
        let route = parse("/report/methodNames/x");
        assert_eq!(route.method_start, METHOD_NAMES_KEY);
        assert_eq!(route.params.as_slice(), ["x"]);
    }

    #[test]
    fn test_unknown_action_uses_first_segment() {
        let route = parse("/missing/login/1");
        assert_eq!(route.action, "missing");
        assert_eq!(route.method_start, DEFAULT_METHOD);
        assert_eq!(route.params.as_slice(), ["login", "1"]);
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let route = parse("//user///logout/");
        assert_eq!(route.action, "user");
        assert_eq!(route.method_start, "logout");
        assert!(route.params.is_empty());
    }

    #[test]
    fn test_empty_path_is_never_empty_action() {
        let route = parse("/");
        assert_eq!(route.action, DEFAULT_METHOD);
        assert_eq!(route.method_start, DEFAULT_METHOD);
    }

    #[test]
    fn test_parse_is_idempotent() {
        for path in ["/user/login", "/report/view/2024/10", "/nope/a/b", "/admin/user"] {
            assert_eq!(parse(path), parse(path));
        }
    }

    #[test]
    fn test_method_match_is_case_sensitive() {
        let route = parse("/user/Login");
        assert_eq!(route.method_start, DEFAULT_METHOD);
        assert_eq!(route.params.as_slice(), ["Login"]);
    }
}
