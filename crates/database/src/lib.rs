pub mod contacts;
pub mod db_connect;
pub mod service;
pub mod users;

use surrealdb::{Surreal, engine::any::Any};

pub use contacts::ContactRepository;
pub use service::{DbCredentials, DbService};
pub use users::{UserRepository, UserStore};

/// Handle to one SurrealDB connection.
///
/// The underlying client multiplexes requests over a single connection and is
/// cheap to clone, so the handle is shared by cloning rather than pooling. An
/// embedded `mem://` datastore only exists inside the client that opened it.
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
}
