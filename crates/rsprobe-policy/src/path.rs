//! Request URL composition and folder arithmetic over storage paths.
//!
//! Paths are relative to a scope. A trailing `/` marks a folder; `/` alone is
//! the scope root.

/// Join `base`, `scope` and `path` with `/` and collapse every run of `/` to
/// a single one. The `scheme://` separator of `base` is left intact.
pub fn compose_url(base: &str, scope: &str, path: &str) -> String {
    let joined = format!("{base}/{scope}/{path}");
    let (prefix, rest) = split_scheme(&joined);

    let mut out = String::with_capacity(joined.len());
    out.push_str(prefix);
    let mut prev_slash = false;
    for c in rest.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

fn split_scheme(url: &str) -> (&str, &str) {
    if let Some(idx) = url.find("://") {
        let scheme = &url[..idx];
        if !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return url.split_at(idx + 3);
        }
    }
    ("", url)
}

/// The folder containing `path`: `a/b` -> `a/`, `a/b/` -> `a/`, `a` -> `/`.
pub fn parent_folder(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => format!("{}/", &trimmed[..idx]),
        None => "/".to_owned(),
    }
}

/// The listing name of `path` inside its parent: `a/b` -> `b`, `a/b/` -> `b/`.
pub fn basename(path: &str) -> String {
    let is_folder = path.ends_with('/');
    let trimmed = path.trim_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if is_folder {
        format!("{name}/")
    } else {
        name.to_owned()
    }
}

/// Every folder above `path`, innermost first, ending with the scope root `/`.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = path.to_owned();
    loop {
        let parent = parent_folder(&current);
        let done = parent == "/";
        out.push(parent.clone());
        if done {
            break;
        }
        current = parent;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_joins_segments_in_order() {
        assert_eq!(
            compose_url("https://example.com/storage/alice", "api-test-suite", "abc/def"),
            "https://example.com/storage/alice/api-test-suite/abc/def"
        );
    }

    #[test]
    fn compose_collapses_slash_runs() {
        assert_eq!(
            compose_url("https://example.com/storage/alice/", "/scope/", "//a///b//"),
            "https://example.com/storage/alice/scope/a/b/"
        );
    }

    #[test]
    fn compose_keeps_scheme_separator() {
        let url = compose_url("http://127.0.0.1:8000", "s", "x");
        assert_eq!(url, "http://127.0.0.1:8000/s/x");
    }

    #[test]
    fn compose_empty_scope_is_storage_root() {
        assert_eq!(
            compose_url("https://h/u", "", "/"),
            "https://h/u/"
        );
    }

    #[test]
    fn compose_never_leaves_double_slash_after_scheme() {
        let inputs = [
            ("https://h", "a", "b"),
            ("https://h/", "/a/", "/b/"),
            ("https://h//x", "a//", "//b"),
            ("https://h", "", ""),
            ("https://h", "public/a", "c/d/"),
        ];
        for (base, scope, path) in inputs {
            let url = compose_url(base, scope, path);
            let rest = url.strip_prefix("https://").unwrap();
            assert!(!rest.contains("//"), "{url}");
            let a = rest.find(scope.trim_matches('/')).unwrap_or(0);
            let b = rest.rfind(path.trim_matches('/')).unwrap_or(rest.len());
            assert!(a <= b, "segment order changed in {url}");
        }
    }

    #[test]
    fn compose_without_scheme_collapses_everything() {
        assert_eq!(compose_url("/base/", "/s/", "/p"), "/base/s/p");
    }

    #[test]
    fn parent_folder_of_nested_document() {
        assert_eq!(parent_folder("a/b/c"), "a/b/");
        assert_eq!(parent_folder("a/b/"), "a/");
        assert_eq!(parent_folder("a"), "/");
        assert_eq!(parent_folder("a/"), "/");
    }

    #[test]
    fn basename_keeps_folder_marker() {
        assert_eq!(basename("a/b"), "b");
        assert_eq!(basename("a/b/"), "b/");
        assert_eq!(basename("top"), "top");
    }

    #[test]
    fn ancestors_end_at_root() {
        assert_eq!(ancestors("a/b/c"), vec!["a/b/", "a/", "/"]);
        assert_eq!(ancestors("doc"), vec!["/"]);
    }
}
