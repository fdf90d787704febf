//! Generic client runtime for resource-oriented HTTP APIs.
//!
//! A caller describes a resource once: its field tags and the route each
//! [`Action`] takes. The runtime then synthesizes the HTTP verb, path, request
//! body and response decoding for create, read, update, delete, list, count,
//! cancel and apply, and layers pagination ([`Client::list_all`]) and polling
//! ([`Client::watch_read`] and friends) on top.

pub mod action;
pub mod api;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod resource;
pub mod watch;

pub use action::{segment, Action, Route};
pub use api::{Client, Exchange, Receipt};
pub use codec::{EncodeBody, FieldTag, FrameFormat, FrameRegistry, Framed, Namespace, Tagged};
pub use config::ClientConfig;
pub use error::{
    format_error, is_auth_error, is_invalid_schema, is_not_found, ApiError, ApiErrorKind, Error, ErrorDetail, Result,
};
pub use resource::{CountedResource, ListResource, PageQuery, Resource, SearchParams};
pub use watch::{watch, CancelToken, Poller, WatchState};
