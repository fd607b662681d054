//! Read-only client for an Audiobookshelf server.
//!
//! Three endpoints are used: the item listing of a library, the current
//! user's bookmarks and progress, and the detail view of a single item (for
//! podcast episodes). See [`Client`].

mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use crate::client::Client;
pub use crate::transport::{HttpTransport, Transport, TransportHandle};
