use crate::{
    PostgresDriver,
    util::{bind_markers, row_to_values, with_timeout},
};
use async_stream::try_stream;
use conduit_core::{
    Command, Connection, ConnectionState, DataError, Error, ErrorContext, Executor, QueryResult,
    Result, RowLabeled, RowNames, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use openssl::ssl::{SslConnector, SslFiletype, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use std::{env, path::Path, pin::pin, sync::Arc};
use tokio::spawn;
use tokio_postgres::{Client, NoTls};
use url::Url;

/// Reopenable Postgres session.
///
/// The url accepts the libpq TLS parameters `sslmode`, `sslrootcert`, `sslcert`
/// and `sslkey`, each one falling back to its `PG*` environment variable.
pub struct PostgresConnection {
    url: Url,
    identity: String,
    client: Option<Client>,
}

impl PostgresConnection {
    /// Validates `url` without connecting.
    pub fn new(url: &str) -> Result<Self> {
        let context = || format!("While reading the Postgres url `{}`", url);
        if !["postgres://", "postgresql://"]
            .iter()
            .any(|prefix| url.starts_with(prefix))
        {
            let error = DataError::argument(format!(
                "Postgres connection url must start with `{}://`",
                <PostgresDriver as conduit_core::Driver>::NAME
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(url).with_context(context)?;
        let mut identity = url.clone();
        let _ = identity.set_password(None);
        identity.set_query(None);
        Ok(Self {
            identity: identity.into(),
            url,
            client: None,
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or_else(|| {
            DataError::resource_state(format!("Connection to `{}` is not open", self.identity))
        })
    }

    async fn connect(&self) -> Result<Client> {
        let mut url = self.url.clone();
        let mut take_url_param = |key: &str, env_var: &str| {
            let mut value = None;
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
            if let Some(pos) = pairs.iter().position(|(k, _)| k == key) {
                let (_, v) = pairs.remove(pos);
                value = Some(v);
            }
            url.query_pairs_mut()
                .clear()
                .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            value.or_else(|| env::var(env_var).ok())
        };
        let sslmode = take_url_param("sslmode", "PGSSLMODE").unwrap_or("disable".into());
        let client = if sslmode == "disable" {
            let (client, connection) = tokio_postgres::connect(url.as_str(), NoTls).await?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        } else {
            let mut builder = SslConnector::builder(SslMethod::tls())?;
            if let Some(path) = take_url_param("sslrootcert", "PGSSLROOTCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_ca_file(path)?;
            }
            if let Some(path) = take_url_param("sslcert", "PGSSLCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_certificate_chain_file(path)?;
            }
            if let Some(path) = take_url_param("sslkey", "PGSSLKEY")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_private_key_file(path, SslFiletype::PEM)?;
            }
            match &*sslmode {
                "require" => builder.set_verify(SslVerifyMode::NONE),
                _ => builder.set_verify(SslVerifyMode::PEER),
            }
            let connector = MakeTlsConnector::new(builder.build());
            let (client, connection) = tokio_postgres::connect(url.as_str(), connector).await?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        };
        Ok(client)
    }
}

impl Executor for PostgresConnection {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    fn run<'s>(
        &'s mut self,
        command: Command,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let context = Arc::new(format!("While running the command:\n{}", command));
        try_stream! {
            let client = self.client()?;
            let (sql, parameters) = bind_markers(&command);
            let statement = with_timeout(command.timeout, client.prepare(&sql)).await?;
            let stream = with_timeout(
                command.timeout,
                client.query_raw(&statement, parameters),
            )
            .await?;
            let mut stream = pin!(stream);
            let mut labels: Option<RowNames> = None;
            while let Some(row) = stream.next().await.transpose()? {
                let labels = labels.get_or_insert_with(|| {
                    row.columns().iter().map(|c| c.name().to_string()).collect()
                });
                yield QueryResult::Row(RowLabeled::new(labels.clone(), row_to_values(row)?));
            }
            if statement.columns().is_empty() {
                let affected = stream.rows_affected().unwrap_or_default();
                yield QueryResult::Affected(RowsAffected::new(affected));
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for PostgresConnection {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn state(&self) -> ConnectionState {
        match &self.client {
            None => ConnectionState::Closed,
            Some(client) if client.is_closed() => ConnectionState::Broken,
            Some(..) => ConnectionState::Open,
        }
    }

    async fn open(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Err(DataError::resource_state(format!(
                "Connection to `{}` is already open",
                self.identity
            )));
        }
        let client = self
            .connect()
            .await
            .with_context(|| format!("While trying to connect to `{}`", self.identity))?;
        log::debug!("Connected to `{}`", self.identity);
        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.client.take().is_some() {
            log::debug!("Disconnected from `{}`", self.identity);
        }
        Ok(())
    }
}
