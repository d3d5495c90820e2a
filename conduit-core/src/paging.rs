use crate::{Command, DataError, Result, SqlWriter, writer::Context};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

/// One page of an ordered query, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub index: u32,
    pub size: u32,
}

impl PageWindow {
    /// Rejects a zero page index or page size before anything is computed from them.
    pub fn new(index: u32, size: u32) -> Result<Self> {
        if index == 0 {
            return Err(DataError::argument("Page index is 1-based and must be at least 1"));
        }
        if size == 0 {
            return Err(DataError::argument("Page size must be greater than zero"));
        }
        Ok(Self { index, size })
    }
    /// First row of the page, 1-based inclusive.
    pub fn row_start(&self) -> u64 {
        (self.index as u64 - 1) * self.size as u64 + 1
    }
    /// Last row of the page, 1-based inclusive.
    pub fn row_end(&self) -> u64 {
        self.index as u64 * self.size as u64
    }
    /// Rows to skip before the page.
    pub fn offset(&self) -> u64 {
        self.row_start() - 1
    }
    pub fn is_first(&self) -> bool {
        self.index == 1
    }
    /// Number of rows the page holds when the query returns `row_count` rows.
    pub fn rows_available(&self, row_count: u64) -> u64 {
        row_count.saturating_sub(self.offset()).min(self.size as u64)
    }
}

pub fn page_count(row_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    row_count.div_ceil(page_size as u64)
}

/// Payload of a paged query along with the totals of the whole query.
#[derive(Debug, Clone, PartialEq)]
pub struct PagingResult<T> {
    pub data: T,
    pub row_count: u64,
    pub page_count: u64,
}

impl<T> PagingResult<T> {
    pub fn new(data: T, row_count: u64, page_size: u32) -> Self {
        Self {
            data,
            row_count,
            page_count: page_count(row_count, page_size),
        }
    }
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PagingResult<U> {
        PagingResult {
            data: f(self.data),
            row_count: self.row_count,
            page_count: self.page_count,
        }
    }
}

static GLOBAL_CACHE: LazyLock<Arc<PagingCache>> = LazyLock::new(|| Arc::new(PagingCache::new()));

/// Rewritten paging templates keyed by connection identity and original query text.
///
/// Entries live as long as the cache, the key space is the set of distinct
/// paged queries of the application. Safe to share across contexts and threads.
#[derive(Default, Debug)]
pub struct PagingCache {
    templates: RwLock<HashMap<Arc<str>, HashMap<Arc<str>, Arc<str>>>>,
}

impl PagingCache {
    pub fn new() -> Self {
        Self::default()
    }
    /// The process-wide cache, used by contexts that are not given their own.
    pub fn global() -> Arc<PagingCache> {
        GLOBAL_CACHE.clone()
    }
    pub fn get(&self, connection: &str, sql: &str) -> Option<Arc<str>> {
        self.templates
            .read()
            .get(connection)
            .and_then(|v| v.get(sql))
            .cloned()
    }
    /// Returns the cached template, building and storing it on the first request.
    ///
    /// A failing build stores nothing.
    pub fn get_or_try_insert(
        &self,
        connection: &str,
        sql: &str,
        build: impl FnOnce() -> Result<String>,
    ) -> Result<Arc<str>> {
        if let Some(template) = self.get(connection, sql) {
            return Ok(template);
        }
        let template: Arc<str> = build()?.into();
        let mut templates = self.templates.write();
        let entry = templates
            .entry(connection.into())
            .or_default()
            .entry(sql.into())
            .or_insert(template);
        Ok(entry.clone())
    }
    pub fn len(&self) -> usize {
        self.templates.read().values().map(HashMap::len).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn clear(&self) {
        self.templates.write().clear();
    }
}

/// The two round trips of a paged query.
#[derive(Debug, Clone, PartialEq)]
pub struct PagingCommands {
    pub window: PageWindow,
    pub count: Command,
    pub page: Command,
}

/// Row-count command of `command`, carrying a copy of its parameters.
pub fn row_count_command(writer: &dyn SqlWriter, command: &Command) -> Command {
    let mut text = String::with_capacity(command.text.len() + 48);
    writer.write_row_count(&mut text, &command.text);
    Command {
        text,
        ..command.clone()
    }
}

/// Builds the row-count and windowed commands of `command`.
pub fn paging_commands(
    writer: &dyn SqlWriter,
    context: Context,
    command: &Command,
    window: PageWindow,
) -> Result<PagingCommands> {
    let mut text = String::with_capacity(command.text.len() + 64);
    if window.is_first() {
        writer.write_first_page(context, &mut text, &command.text, window)?;
    } else {
        writer.write_page(context, &mut text, &command.text, window)?;
    }
    let page = Command {
        text,
        ..command.clone()
    };
    Ok(PagingCommands {
        window,
        count: row_count_command(writer, command),
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parameter, Vendor, data_error};

    #[test]
    fn window_math() {
        let window = PageWindow::new(10, 10).unwrap();
        assert_eq!(window.row_start(), 91);
        assert_eq!(window.row_end(), 100);
        assert_eq!(window.offset(), 90);
        assert_eq!(window.rows_available(95), 5);
        assert_eq!(page_count(95, 10), 10);
        assert_eq!(page_count(100, 10), 10);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(PageWindow::new(11, 10).unwrap().rows_available(95), 0);
        let window = PageWindow::new(u32::MAX, u32::MAX).unwrap();
        assert_eq!(window.row_end(), u32::MAX as u64 * u32::MAX as u64);
    }

    #[test]
    fn invalid_windows_are_rejected() {
        for (index, size) in [(0, 10), (1, 0)] {
            let error = PageWindow::new(index, size).unwrap_err();
            assert!(matches!(data_error(&error), Some(DataError::Argument(..))));
        }
    }

    #[test]
    fn paging_commands_copy_parameters() {
        let cache = PagingCache::new();
        let command = Command::new("SELECT * FROM t WHERE a = :A ORDER BY a")
            .with_parameters(vec![Parameter::new(":A", 5)]);
        let commands = paging_commands(
            Vendor::PostgreSql.sql_writer(),
            Context::new("postgres://db", &cache),
            &command,
            PageWindow::new(2, 10).unwrap(),
        )
        .unwrap();
        assert_eq!(
            commands.count.text,
            "SELECT COUNT(1) FROM (SELECT * FROM t WHERE a = :A) AS count_wrapper"
        );
        assert_eq!(commands.count.parameters, command.parameters);
        assert_eq!(commands.page.parameters, command.parameters);
        assert!(commands.page.text.ends_with("LIMIT 10 OFFSET 10"));
    }

    #[test]
    fn cache_keeps_the_first_template() {
        let cache = PagingCache::new();
        let first = cache
            .get_or_try_insert("a", "SELECT 1", || Ok("one".into()))
            .unwrap();
        let second = cache
            .get_or_try_insert("a", "SELECT 1", || Ok("two".into()))
            .unwrap();
        assert_eq!(&*first, "one");
        assert_eq!(&*second, "one");
        assert!(
            cache
                .get_or_try_insert("b", "SELECT 1", || Err(DataError::format("nope")))
                .is_err()
        );
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
