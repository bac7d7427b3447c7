//! Observable loading/data/error state for async calls
//!
//! Binds an async loader (typically an API call) or a ready value to a state
//! a UI can observe: current data, whether a call is in flight, and the last
//! error. Changes are broadcast through a `tokio::sync::watch` channel.
//!
//! ```ignore
//! use macrohttp_state::{wrap_list_state, AsyncStateOptions};
//!
//! let users = wrap_list_state(
//!     move |page: u32| {
//!         let api = api.clone();
//!         async move { api.get("/users", RequestOptions::new().param("page", page)).await.map(|r| r.data) }
//!     },
//!     None,
//!     None,
//! );
//!
//! users.execute(1).await?;
//! let snapshot = users.snapshot();
//! ```

pub mod error;
pub mod source;
pub mod state;
pub mod wrap;

pub use error::{Result, StateError};
pub use source::Source;
pub use state::{AsyncState, AsyncStateOptions, Snapshot};
pub use wrap::{wrap_list_state, wrap_state};
