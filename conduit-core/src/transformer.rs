use crate::{Argument, Command, DataError, Parameter, Result, SqlWriter, Statement, Value};

/// Scans `text` for `{...}` placeholders and replaces each one with `resolve(inner)`.
///
/// `{{` and `}}` are escapes emitting a single brace. The inner text is trimmed
/// before resolution. An unmatched brace is a format error.
pub fn rewrite_placeholders(
    text: &str,
    mut resolve: impl FnMut(&str) -> Result<String>,
) -> Result<String> {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|(_, c)| *c == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let end = loop {
                    match chars.next() {
                        Some((j, '}')) => break j,
                        Some((_, '{')) | None => {
                            return Err(DataError::format(format!(
                                "Unmatched `{{` at offset {} in command text",
                                i
                            )));
                        }
                        _ => {}
                    }
                };
                out.push_str(&resolve(text[i + 1..end].trim())?);
            }
            '}' => {
                if chars.next_if(|(_, c)| *c == '}').is_some() {
                    out.push('}');
                    continue;
                }
                return Err(DataError::format(format!(
                    "Unmatched `}}` at offset {} in command text",
                    i
                )));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Binds statements against one vendor strategy, producing executable commands.
///
/// All validation happens here, before any connection is touched.
#[derive(Clone, Copy)]
pub struct Binder<'w> {
    writer: &'w dyn SqlWriter,
}

impl<'w> Binder<'w> {
    pub fn new(writer: &'w dyn SqlWriter) -> Self {
        Self { writer }
    }

    /// Replaces `{Name}` placeholders with the prefixed form of the matching bound name.
    ///
    /// Lookup is case-insensitive and the bound spelling is emitted. With no
    /// bound names the text is returned unchanged.
    pub fn format_named(&self, text: &str, names: &[String]) -> Result<String> {
        if names.is_empty() {
            return Ok(text.to_owned());
        }
        let markers: Vec<String> = names.iter().map(|n| self.writer.parameter_name(n)).collect();
        rewrite_placeholders(text, |name| {
            let wanted = self.writer.parameter_name(name);
            markers
                .iter()
                .find(|m| m.eq_ignore_ascii_case(&wanted))
                .cloned()
                .ok_or_else(|| {
                    DataError::format(format!(
                        "Placeholder `{{{}}}` does not match any bound parameter",
                        name
                    ))
                })
        })
    }

    /// Replaces `{0}`, `{1}`, ... with the markers of the synthesized names `p0`, `p1`, ...
    pub fn format_positional(&self, text: &str, count: usize) -> Result<String> {
        rewrite_placeholders(text, |index| {
            match index.parse::<usize>() {
                Ok(i) if i < count => Ok(self.writer.parameter_name(&positional_name(i))),
                _ => Err(DataError::format(format!(
                    "Placeholder `{{{}}}` is not an index below {}",
                    index, count
                ))),
            }
        })
    }

    pub fn bind(&self, statement: Statement) -> Result<Command> {
        let Statement {
            text,
            positional,
            named,
            timeout,
        } = statement;
        if text.trim().is_empty() {
            return Err(DataError::argument("Command text must not be empty"));
        }
        if !positional.is_empty() && !named.is_empty() {
            return Err(DataError::argument(
                "Positional and named bindings cannot be mixed in one statement",
            ));
        }
        let (text, parameters) = if !named.is_empty() {
            self.bind_named(&text, named)?
        } else if !positional.is_empty() {
            self.bind_positional(text, positional)?
        } else {
            (text, Vec::new())
        };
        log::debug!(
            "Bound command for {:?}: {}",
            self.writer.vendor(),
            crate::truncate_long!(text)
        );
        Ok(Command {
            text,
            parameters,
            timeout,
            transaction: None,
        })
    }

    fn bind_named(
        &self,
        text: &str,
        named: Vec<(String, Value)>,
    ) -> Result<(String, Vec<Parameter>)> {
        let mut names: Vec<String> = Vec::with_capacity(named.len());
        for (name, _) in &named {
            if name.trim().is_empty() {
                return Err(DataError::argument("Parameter names must not be empty"));
            }
            if names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                return Err(DataError::argument(format!(
                    "Parameter `{}` is bound more than once",
                    name
                )));
            }
            names.push(name.clone());
        }
        let text = self.format_named(text, &names)?;
        let parameters = named
            .into_iter()
            .map(|(name, value)| Parameter::new(self.writer.parameter_name(&name), value))
            .collect();
        Ok((text, parameters))
    }

    fn bind_positional(
        &self,
        text: String,
        arguments: Vec<Argument>,
    ) -> Result<(String, Vec<Parameter>)> {
        let prebuilt = arguments
            .iter()
            .filter(|a| matches!(a, Argument::Parameter(..)))
            .count();
        if prebuilt == arguments.len() {
            let parameters = arguments
                .into_iter()
                .filter_map(|a| match a {
                    Argument::Parameter(mut p) => {
                        p.name = self.writer.parameter_name(&p.name);
                        Some(p)
                    }
                    Argument::Value(..) => None,
                })
                .collect();
            return Ok((text, parameters));
        }
        if prebuilt > 0 {
            return Err(DataError::argument(
                "Parameter objects and plain values cannot be mixed in one argument list",
            ));
        }
        let text = self.format_positional(&text, arguments.len())?;
        let parameters = arguments
            .into_iter()
            .enumerate()
            .map(|(i, a)| {
                Parameter::new(self.writer.parameter_name(&positional_name(i)), a.into_value())
            })
            .collect();
        Ok((text, parameters))
    }
}

pub fn positional_name(index: usize) -> String {
    format!("p{}", index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Vendor, data_error};

    fn format_error(result: Result<impl std::fmt::Debug>) -> bool {
        matches!(
            data_error(&result.unwrap_err()),
            Some(DataError::Format(..))
        )
    }

    fn argument_error(result: Result<impl std::fmt::Debug>) -> bool {
        matches!(
            data_error(&result.unwrap_err()),
            Some(DataError::Argument(..))
        )
    }

    #[test]
    fn named_placeholders_and_escapes() {
        let binder = Binder::new(Vendor::SqlServer.sql_writer());
        let text = binder
            .format_named(
                "SELECT * FROM T WHERE A={X} AND B={{esc}} ORDER BY A",
                &["X".into()],
            )
            .unwrap();
        assert_eq!(text, "SELECT * FROM T WHERE A=@X AND B={esc} ORDER BY A");
    }

    #[test]
    fn named_lookup_is_case_insensitive_and_keeps_bound_spelling() {
        let binder = Binder::new(Vendor::PostgreSql.sql_writer());
        let text = binder
            .format_named(
                "UPDATE users SET name = { userName } WHERE id = {ID}",
                &["UserName".into(), "Id".into()],
            )
            .unwrap();
        assert_eq!(text, "UPDATE users SET name = :UserName WHERE id = :Id");
    }

    #[test]
    fn unknown_name_is_a_lookup_failure() {
        let binder = Binder::new(Vendor::MySql.sql_writer());
        assert!(format_error(
            binder.format_named("SELECT {Missing}", &["Present".into()])
        ));
    }

    #[test]
    fn unmatched_braces() {
        let binder = Binder::new(Vendor::SqlServer.sql_writer());
        let names = ["A".to_string()];
        assert!(format_error(binder.format_named("SELECT {A", &names)));
        assert!(format_error(binder.format_named("SELECT A}", &names)));
        assert!(format_error(binder.format_named("SELECT {A{B}}", &names)));
        assert!(format_error(binder.format_positional("SELECT }{0}", 1)));
    }

    #[test]
    fn no_names_leaves_text_untouched() {
        let binder = Binder::new(Vendor::SqlServer.sql_writer());
        assert_eq!(binder.format_named("SELECT '{'", &[]).unwrap(), "SELECT '{'");
    }

    #[test]
    fn prefixed_names_are_not_prefixed_twice() {
        let binder = Binder::new(Vendor::SqlServer.sql_writer());
        let text = binder.format_named("WHERE a = {@A}", &["@A".into()]).unwrap();
        assert_eq!(text, "WHERE a = @A");
    }

    #[test]
    fn positional_binding() {
        let binder = Binder::new(Vendor::Oracle.sql_writer());
        let command = binder
            .bind(
                Statement::new("INSERT INTO t (a, b, c) VALUES ({0}, {1}, {0}) -- {{0}}")
                    .bind(1)
                    .bind("two"),
            )
            .unwrap();
        assert_eq!(
            command.text,
            "INSERT INTO t (a, b, c) VALUES (:p0, :p1, :p0) -- {0}"
        );
        assert_eq!(
            command.parameters,
            vec![
                Parameter::new(":p0", 1),
                Parameter::new(":p1", "two"),
            ]
        );
        assert!(format_error(
            binder.bind(Statement::new("SELECT {2}").bind(1))
        ));
        assert!(format_error(
            binder.bind(Statement::new("SELECT {name}").bind(1))
        ));
    }

    #[test]
    fn prebuilt_parameters_are_attached_as_they_are() {
        let binder = Binder::new(Vendor::SqlServer.sql_writer());
        let command = binder
            .bind(
                Statement::new("EXEC proc @Id, @Name")
                    .bind(Parameter::new("Id", 1))
                    .bind(Parameter::new("@Name", "x")),
            )
            .unwrap();
        assert_eq!(command.text, "EXEC proc @Id, @Name");
        assert_eq!(command.parameters[0].name, "@Id");
        assert_eq!(command.parameters[1].name, "@Name");
    }

    #[test]
    fn binding_validation() {
        let binder = Binder::new(Vendor::Sqlite.sql_writer());
        assert!(argument_error(binder.bind(Statement::new("   "))));
        assert!(argument_error(binder.bind(
            Statement::new("SELECT {0}")
                .bind(1)
                .bind(Parameter::new("x", 2))
        )));
        assert!(argument_error(binder.bind(
            Statement::new("SELECT {0}")
                .bind(1)
                .bind_named("x", 2)
        )));
        assert!(argument_error(binder.bind(
            Statement::new("SELECT {x}")
                .bind_named("x", 1)
                .bind_named("X", 2)
        )));
    }

    #[test]
    fn statement_without_bindings_passes_through() {
        let binder = Binder::new(Vendor::SqlServer.sql_writer());
        let command = binder.bind("SELECT '{not a placeholder'".into()).unwrap();
        assert_eq!(command.text, "SELECT '{not a placeholder'");
        assert!(command.parameters.is_empty());
    }
}
