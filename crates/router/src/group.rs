//! Route groups sharing a path prefix and a middleware chain.
//!
//! A group borrows its router mutably and registers straight into it. Nested groups
//! extend the prefix with `path.Join` semantics and append their middleware to the
//! parent's, so `Group("/api", [a]).group("/users", [b]).get("/:id", [c])` registers
//! `/api/users/:id` with the chain `[a, b, c]`. Opening a nested group never changes the
//! parent.

use crate::error::Error;
use crate::handler::BoxHandler;
use crate::router::Router;
use crate::utils::{join_path, method_route};
use http::Method;
use std::fmt;

pub struct Group<'r> {
    router: &'r mut Router,
    prefix: String,
    middleware: Vec<BoxHandler>,
}

impl<'r> Group<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: &str, middleware: Vec<BoxHandler>) -> Self {
        Self { router, prefix: prefix.to_owned(), middleware }
    }

    /// The accumulated path prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers `sub_path` below this group's prefix
    ///
    /// The group middleware runs first, then `handlers` in the given order.
    pub fn handle<I>(&mut self, method: Method, sub_path: &str, handlers: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = BoxHandler>,
    {
        let path = join_path(&self.prefix, sub_path);
        let chain = self.middleware.iter().cloned().chain(handlers);
        self.router.handle(method, &path, chain)
    }

    method_route!(get, GET);
    method_route!(put, PUT);
    method_route!(post, POST);
    method_route!(delete, DELETE);
    method_route!(options, OPTIONS);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);

    /// Opens a nested group, `handlers` run after this group's middleware
    pub fn group<I>(&mut self, sub_path: &str, handlers: I) -> Group<'_>
    where
        I: IntoIterator<Item = BoxHandler>,
    {
        let prefix = join_path(&self.prefix, sub_path);
        let middleware = self.middleware.iter().cloned().chain(handlers).collect();
        Group { router: &mut *self.router, prefix, middleware }
    }
}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
