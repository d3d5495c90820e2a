use crate::ValueHolder;
use conduit_core::{Command, Direction, Error, Result, Row};
use std::{fmt::Write, future::Future, time::Duration};
use tokio::time::timeout;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites the `:name` markers of `command` into the `$n` markers of the wire
/// protocol, returning the values in marker order.
///
/// Literals, quoted identifiers, comments and `::` casts are copied through.
/// A marker that names no parameter is left untouched.
pub(crate) fn bind_markers(command: &Command) -> (String, Vec<ValueHolder>) {
    let text = command.text.trim_end().trim_end_matches(';');
    let mut sql = String::with_capacity(text.len());
    let mut bound: Vec<&str> = Vec::new();
    let mut values = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                sql.push(c);
                for (_, n) in chars.by_ref() {
                    sql.push(n);
                    if n == c {
                        break;
                    }
                }
            }
            '-' if matches!(chars.peek(), Some((_, '-'))) => {
                sql.push(c);
                for (_, n) in chars.by_ref() {
                    sql.push(n);
                    if n == '\n' {
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                sql.push(c);
                if let Some((_, star)) = chars.next() {
                    sql.push(star);
                }
                let mut previous = ' ';
                for (_, n) in chars.by_ref() {
                    sql.push(n);
                    if previous == '*' && n == '/' {
                        break;
                    }
                    previous = n;
                }
            }
            ':' if matches!(chars.peek(), Some((_, ':'))) => {
                sql.push_str("::");
                chars.next();
            }
            ':' => {
                let start = i + 1;
                let mut end = start;
                while let Some((j, n)) = chars.peek()
                    && is_name_char(*n)
                {
                    end = j + n.len_utf8();
                    chars.next();
                }
                let name = &text[start..end];
                let parameter = (!name.is_empty())
                    .then(|| {
                        command
                            .parameters
                            .iter()
                            .find(|p| p.name.trim_start_matches(':').eq_ignore_ascii_case(name))
                    })
                    .flatten();
                match parameter {
                    Some(parameter) => {
                        if parameter.direction != Direction::Input {
                            log::warn!(
                                "Parameter `{}` is bound as {:?}, Postgres only sends it as input",
                                parameter.name,
                                parameter.direction
                            );
                        }
                        let position = match bound
                            .iter()
                            .position(|b| b.eq_ignore_ascii_case(name))
                        {
                            Some(position) => position,
                            None => {
                                bound.push(name);
                                values.push(ValueHolder(parameter.value.clone()));
                                bound.len() - 1
                            }
                        };
                        let _ = write!(sql, "${}", position + 1);
                    }
                    None => {
                        sql.push(':');
                        sql.push_str(name);
                    }
                }
            }
            _ => sql.push(c),
        }
    }
    (sql, values)
}

pub(crate) fn row_to_values(row: tokio_postgres::Row) -> Result<Row> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let col = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not deserialize column {} `{}`: {}",
                    i,
                    col.name(),
                    col.type_()
                )))
            }
        })
        .collect()
}

pub(crate) async fn with_timeout<T, E>(
    duration: Option<Duration>,
    future: impl Future<Output = std::result::Result<T, E>>,
) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match duration {
        Some(duration) => timeout(duration, future)
            .await
            .map_err(|_| Error::msg(format!("Command timed out after {:?}", duration)))?
            .map_err(Error::new),
        None => future.await.map_err(Error::new),
    }
}
