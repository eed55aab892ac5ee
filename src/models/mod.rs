use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};

mod category;
mod servers;
mod user;

pub use category::*;
pub use servers::*;
pub use user::*;

use crate::Error;

#[derive(Clone, Debug)]
pub struct Backend {
    pub pool: Pool<ConnectionManager<PgConnection>>,
}

impl Backend {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    pub fn get_connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, Error> {
        self.pool.get().map_err(|e| e.into())
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
