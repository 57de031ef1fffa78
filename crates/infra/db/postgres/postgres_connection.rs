use anyhow::{Context, Result};
use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
    sql_query,
    RunQueryDsl,
};

/// Pins every pooled session to UTC so `CURRENT_DATE` agrees across connections.
#[derive(Debug, Default)]
struct UtcSession;

impl CustomizeConnection<PgConnection, R2d2Error> for UtcSession {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        sql_query("SET TIME ZONE 'UTC'")
            .execute(conn)
            .map(|_| ())
            .map_err(R2d2Error::QueryError)
    }
}

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(database_url: &str, max_connections: u32) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_connections)
        .connection_customizer(Box::new(UtcSession))
        .build(manager)
        .context("failed to build postgres connection pool")?;
    Ok(pool)
}
