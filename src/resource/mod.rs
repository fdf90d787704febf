//! Resource abstraction layer
//!
//! A resource describes one API entity: its name, its group, and the route each
//! action takes. Everything the dispatcher, the pagination aggregator and the
//! watch engine do is written against the traits in this module.
//!
//! # Architecture
//!
//! - [`traits`] - Identity / List / Countable-List capability tiers
//! - [`search`] - Offset/limit search parameters and query-string encoding
//!
//! # Example
//!
//! ```ignore
//! use resclient::{Action, FieldTag, Resource, Route, Tagged};
//!
//! #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
//! #[serde(default)]
//! struct App { id: String, name: String }
//!
//! impl Tagged for App {
//!     const FIELDS: &'static [FieldTag] = &[
//!         FieldTag::new("id").read("id"),
//!         FieldTag::new("name").read("name").create("name"),
//!     ];
//! }
//!
//! impl Resource for App {
//!     fn name(&self) -> &str { "app" }
//!     fn group(&self) -> &str { "apps" }
//!     fn route(&self, action: Action) -> Option<Route> {
//!         match action {
//!             Action::Create => Some(Route::new(action, "/apps")),
//!             Action::Read => Some(Route::new(action, format!("/apps/{}", self.id))),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

pub mod search;
pub mod traits;

pub use search::{query_pairs, validate_limit, PageQuery, SearchParams};
pub use traits::{CountedItems, CountedResource, ListItems, ListResource, Resource};
