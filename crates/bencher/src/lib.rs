/// A request line to resolve against a route table
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    request: TestRequest,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, request: TestRequest) -> Self {
        Self { name, group, request }
    }

    pub fn hit(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Hit, request)
    }

    pub fn miss(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Miss, request)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn request(&self) -> &TestRequest {
        &self.request
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestRequest {
    method: &'static str,
    path: &'static str,
}

impl TestRequest {
    pub const fn new(method: &'static str, path: &'static str) -> Self {
        Self { method, path }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    /// a registered route serves the request
    Hit,
    /// the request falls through to the not found chain
    Miss,
}

/// `(method, pattern)` pairs shaped like a small REST API
pub static API_ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/hello/world/:name"),
    ("GET", "/users"),
    ("POST", "/users"),
    ("GET", "/users/:id"),
    ("PUT", "/users/:id"),
    ("DELETE", "/users/:id"),
    ("GET", "/users/:id/posts"),
    ("GET", "/users/:id/posts/:post"),
    ("GET", "/repos/:owner/:repo/issues/:number/comments"),
    ("GET", "/orgs/:org/teams/:team/members"),
    ("GET", "/static/*"),
];
