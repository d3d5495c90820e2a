use crate::PagingCache;

/// Environment of a paging rewrite: which connection the query targets and where
/// rewritten templates are cached.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Connection identity, first half of the template cache key.
    pub connection: &'a str,
    pub cache: &'a PagingCache,
}

impl<'a> Context<'a> {
    pub fn new(connection: &'a str, cache: &'a PagingCache) -> Self {
        Self { connection, cache }
    }
}
