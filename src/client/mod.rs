//! Client side of the API.
//!
//! [`ApiClient`] is the typed HTTP surface. The stores wrap it with observable state:
//! each one owns a snapshot that is replaced (never mutated in place) on every action
//! and published through a `tokio::sync::watch` channel. Stores are plain values handed
//! to whoever needs them; there is no global instance.

mod actualites;
mod api;
mod auth;
mod error;
mod events;
pub mod state;

pub use actualites::ActualiteStore;
pub use api::ApiClient;
pub use auth::{AuthAction, AuthSnapshot, AuthStore, reduce_auth};
pub use error::{ClientError, ClientResult};
pub use events::EventStore;
pub use state::{CollectionAction, CollectionSnapshot, Keyed, Store, reduce};
