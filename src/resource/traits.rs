//! Capability tiers a resource type can opt into
//!
//! Identity ([`Resource`]) is mandatory. [`ListResource`] and
//! [`CountedResource`] add item collections and remote counts. The typed entry
//! points (`Client::list`, `Client::count`, `Client::list_all`) reach them
//! through the trait bounds. The untyped `Client::dispatch` only sees a
//! `Resource` and asks through [`Resource::as_list_mut`] and
//! [`Resource::as_counted_mut`], which a type answers with `Some(self)` when it
//! wants list and count payloads on that path too.

use super::search::SearchParams;
use crate::action::{Action, Route};
use crate::codec::{decode_for_read, Tagged};
use crate::error::Result;
use serde_json::Value;

/// Identity capability.
///
/// `Clone` must be a total deep copy (owned `Vec`s, `String`s and nested
/// values, no shared handles) and `PartialEq` a structural comparison: the
/// pagination and watch code snapshot and compare resources through them.
pub trait Resource: Tagged + Clone + PartialEq + Send + Sync {
    /// Human-readable name, used in errors and logs.
    fn name(&self) -> &str;

    /// Group / namespace label.
    fn group(&self) -> &str;

    /// Method and path for `action`, or `None` when this resource does not support it.
    fn route(&self, action: Action) -> Option<Route>;

    /// Post-decode hook, run once after every successful decode.
    fn init(&mut self) {}

    fn as_list_mut(&mut self) -> Option<&mut dyn ListItems> {
        None
    }

    fn as_counted_mut(&mut self) -> Option<&mut dyn CountedItems> {
        None
    }
}

/// List capability: an ordered collection of decoded items.
pub trait ListResource: Resource {
    type Item: Tagged + Default + Clone + PartialEq + Send + Sync;

    fn items(&self) -> &[Self::Item];

    fn items_mut(&mut self) -> &mut Vec<Self::Item>;

    fn item_count(&self) -> usize {
        self.items().len()
    }

    fn get_item(&self, index: usize) -> Option<&Self::Item> {
        self.items().get(index)
    }

    fn push_item(&mut self, item: Self::Item) {
        self.items_mut().push(item);
    }

    fn clear_items(&mut self) {
        self.items_mut().clear();
    }

    fn set_items(&mut self, items: Vec<Self::Item>) {
        *self.items_mut() = items;
    }
}

/// Countable-list capability: a list whose remote size can be queried.
pub trait CountedResource: ListResource {
    type Search: SearchParams + Default + Clone;

    /// Largest page the server accepts.
    const MAX_PAGE_SIZE: u32;

    fn count(&self) -> u64;

    fn set_count(&mut self, count: u64);

    /// Search parameters used when the caller passes none.
    fn default_search(&self) -> Self::Search {
        let mut search = Self::Search::default();
        search.set_limit(Self::MAX_PAGE_SIZE);
        search
    }
}

/// Object-safe view of a list resource, used by the dispatcher.
pub trait ListItems {
    /// Replace the item collection with decoded wire items.
    fn replace_from_wire(&mut self, items: Vec<Value>) -> Result<()>;

    fn wire_item_count(&self) -> usize;
}

impl<T: ListResource> ListItems for T {
    fn replace_from_wire(&mut self, items: Vec<Value>) -> Result<()> {
        let decoded = items
            .into_iter()
            .map(decode_for_read::<T::Item>)
            .collect::<Result<Vec<_>>>()?;
        self.set_items(decoded);
        Ok(())
    }

    fn wire_item_count(&self) -> usize {
        self.item_count()
    }
}

/// Object-safe view of a countable resource, used by the dispatcher.
pub trait CountedItems {
    fn record_count(&mut self, count: u64);
}

impl<T: CountedResource> CountedItems for T {
    fn record_count(&mut self, count: u64) {
        self.set_count(count);
    }
}
