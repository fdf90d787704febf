//! Count-then-paginate aggregation
//!
//! The total is counted once, up front. If the remote collection changes while
//! pages are being fetched the result can be stale or contain duplicates; the
//! loop never re-counts.

use super::client::{Client, Receipt};
use crate::error::Result;
use crate::resource::{validate_limit, CountedResource, SearchParams};

impl Client {
    /// Fetch every remote item into `resource`.
    ///
    /// With `search` unset, the resource's default search parameters are used
    /// (limit = its maximum page size). The returned receipt is that of the last
    /// request issued.
    pub async fn list_all<R: CountedResource>(&self, resource: &mut R, search: Option<R::Search>) -> Result<Receipt> {
        let mut search = search.unwrap_or_else(|| resource.default_search());
        validate_limit(search.limit(), R::MAX_PAGE_SIZE)?;
        search.set_offset(0);

        let mut receipt = self.count(resource, Some(&search)).await?;
        let total = resource.count();
        resource.clear_items();

        let limit = u64::from(search.limit());
        let template = resource.clone();
        let mut offset = 0u64;

        tracing::debug!("list_all {}: {} items, page size {}", resource.name(), total, limit);

        while offset < total {
            let mut page = template.clone();
            search.set_offset(offset);
            receipt = self.list(&mut page, Some(&search)).await?;

            let fetched = page.item_count();
            if (fetched as u64) < limit.min(total - offset) {
                tracing::debug!("short page at offset {}: {} items", offset, fetched);
            }
            for item in page.items_mut().drain(..) {
                resource.push_item(item);
            }
            offset += limit;
        }

        Ok(receipt)
    }
}
