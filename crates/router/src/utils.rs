//! Utility macros and path helpers used internally by the router crate.

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(template.starts_with('/'), PatternError::MissingLeadingSlash);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Expands to a registration method for one HTTP method, delegating to `self.handle`.
macro_rules! method_route {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers a `", stringify!($method), "` route, see [`Self::handle`]")]
        pub fn $name<I>(&mut self, pattern: &str, handlers: I) -> Result<(), crate::error::Error>
        where
            I: IntoIterator<Item = crate::handler::BoxHandler>,
        {
            self.handle(http::Method::$method, pattern, handlers)
        }
    };
}

pub(crate) use method_route;

/// Joins a group prefix and a sub path with POSIX `path.Join` semantics.
///
/// An empty prefix leaves the sub path untouched, so routes registered straight on a
/// router keep their template verbatim.
pub(crate) fn join_path(prefix: &str, sub_path: &str) -> String {
    if prefix.is_empty() {
        return sub_path.to_owned();
    }

    clean_path(&format!("{prefix}/{sub_path}"))
}

/// Lexically normalizes a slash separated path.
///
/// Repeated slashes collapse into one, `.` elements are dropped, `..` removes the
/// previous element and a trailing slash is removed unless the result is the root.
pub(crate) fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::with_capacity(8);

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_path, join_path};

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("//api///users/"), "/api/users");
        assert_eq!(clean_path("/api/./users/../posts"), "/api/posts");
        assert_eq!(clean_path("/../a"), "/a");
        assert_eq!(clean_path("a/../.."), "..");
        assert_eq!(clean_path(""), ".");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/users/:id"), "/users/:id");
        assert_eq!(join_path("/api", "/users"), "/api/users");
        assert_eq!(join_path("/api/", "users/"), "/api/users");
        assert_eq!(join_path("/api", "/"), "/api");
        assert_eq!(join_path("/", "/"), "/");
        assert_eq!(join_path("/files", "/*"), "/files/*");
    }
}
