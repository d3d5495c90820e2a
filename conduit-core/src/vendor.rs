use crate::{
    DataError, Error, MySqlWriter, OracleWriter, PostgresWriter, Result, SqlServerLegacyWriter,
    SqlServerWriter, SqlWriter, SqliteWriter,
};
use std::{
    fmt::{self, Display},
    str::FromStr,
};
use url::Url;

/// Relational backends with a paging and parameter strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    SqlServer,
    /// SQL Server without OFFSET / FETCH (before 2012).
    SqlServerLegacy,
    Oracle,
    MySql,
    PostgreSql,
    Sqlite,
}

static SQL_SERVER: SqlServerWriter = SqlServerWriter {};
static SQL_SERVER_LEGACY: SqlServerLegacyWriter = SqlServerLegacyWriter {};
static ORACLE: OracleWriter = OracleWriter {};
static MYSQL: MySqlWriter = MySqlWriter {};
static POSTGRES: PostgresWriter = PostgresWriter {};
static SQLITE: SqliteWriter = SqliteWriter {};

impl Vendor {
    pub const ALL: [Vendor; 6] = [
        Vendor::SqlServer,
        Vendor::SqlServerLegacy,
        Vendor::Oracle,
        Vendor::MySql,
        Vendor::PostgreSql,
        Vendor::Sqlite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Vendor::SqlServer => "sqlserver",
            Vendor::SqlServerLegacy => "sqlserver-legacy",
            Vendor::Oracle => "oracle",
            Vendor::MySql => "mysql",
            Vendor::PostgreSql => "postgres",
            Vendor::Sqlite => "sqlite",
        }
    }

    /// The strategy of this vendor.
    pub fn sql_writer(&self) -> &'static dyn SqlWriter {
        match self {
            Vendor::SqlServer => &SQL_SERVER,
            Vendor::SqlServerLegacy => &SQL_SERVER_LEGACY,
            Vendor::Oracle => &ORACLE,
            Vendor::MySql => &MYSQL,
            Vendor::PostgreSql => &POSTGRES,
            Vendor::Sqlite => &SQLITE,
        }
    }

    /// Vendor of a connection url, from its scheme.
    pub fn from_url(url: &str) -> Result<Vendor> {
        let parsed = Url::parse(url).map_err(|e| {
            Error::new(e).context(format!("While reading the scheme of `{}`", url))
        })?;
        parsed.scheme().parse()
    }
}

impl FromStr for Vendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let identity = s.trim().to_ascii_lowercase();
        Ok(match identity.as_str() {
            "sqlserver" | "mssql" | "sqlclient" | "tds" => Vendor::SqlServer,
            "sqlserver-legacy" | "sqlserver2008" | "mssql-legacy" => Vendor::SqlServerLegacy,
            "oracle" | "oracleclient" => Vendor::Oracle,
            "mysql" | "mariadb" => Vendor::MySql,
            "postgres" | "postgresql" | "npgsql" => Vendor::PostgreSql,
            "sqlite" | "sqlite3" => Vendor::Sqlite,
            _ => {
                return Err(DataError::argument(format!(
                    "Unknown database vendor `{}`",
                    s
                )));
            }
        })
    }
}

impl Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_prefixes() {
        let prefixes: Vec<char> = Vendor::ALL
            .iter()
            .map(|v| v.sql_writer().parameter_prefix())
            .collect();
        assert_eq!(prefixes, ['@', '@', ':', '?', ':', ':']);
        for vendor in Vendor::ALL {
            assert_eq!(vendor.sql_writer().vendor(), vendor);
            assert_eq!(vendor.name().parse::<Vendor>().unwrap(), vendor);
        }
    }

    #[test]
    fn vendor_from_identity_and_url() {
        assert_eq!("PostgreSQL".parse::<Vendor>().unwrap(), Vendor::PostgreSql);
        assert_eq!(" MSSQL ".parse::<Vendor>().unwrap(), Vendor::SqlServer);
        assert_eq!(
            Vendor::from_url("postgres://user@localhost/db").unwrap(),
            Vendor::PostgreSql
        );
        assert_eq!(Vendor::from_url("sqlite::memory:").unwrap(), Vendor::Sqlite);
        assert!(Vendor::from_url("Server=.;Database=x").is_err());
        assert!("db2".parse::<Vendor>().is_err());
    }
}
