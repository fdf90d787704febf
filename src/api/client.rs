//! API Client
//!
//! Main client for resource-oriented APIs. Resolves the route of an action,
//! encodes the body for the action's namespace, performs the exchange and
//! decodes the envelope back into the caller's resource.

use super::envelope::{parse_error, Envelope, Payload};
use super::http::{Exchange, HttpTransport};
use crate::action::Action;
use crate::codec::{decode_into, EncodeBody, Namespace};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::resource::{CountedItems, CountedResource, ListItems, ListResource, Resource, SearchParams};
use url::Url;

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub request_id: String,
    pub status: u16,
    /// Follow-up location of a long-running job, for async-accepted responses.
    pub job_url: Option<String>,
}

impl Receipt {
    pub fn is_accepted(&self) -> bool {
        self.job_url.is_some()
    }
}

/// How the dispatcher reaches the list and count views of `R`.
///
/// The typed entry points already know `R` implements the richer tiers and
/// use them directly; only [`Client::dispatch`] asks the resource at runtime.
struct Capabilities<R> {
    list: fn(&mut R) -> Option<&mut dyn ListItems>,
    counted: fn(&mut R) -> Option<&mut dyn CountedItems>,
}

impl<R: Resource> Capabilities<R> {
    fn queried() -> Self {
        Self {
            list: R::as_list_mut,
            counted: R::as_counted_mut,
        }
    }

    fn listed() -> Self
    where
        R: ListResource,
    {
        Self {
            list: list_view::<R>,
            counted: R::as_counted_mut,
        }
    }

    fn counted_list() -> Self
    where
        R: CountedResource,
    {
        Self {
            list: list_view::<R>,
            counted: counted_view::<R>,
        }
    }
}

fn list_view<R: ListResource>(resource: &mut R) -> Option<&mut dyn ListItems> {
    Some(resource)
}

fn counted_view<R: CountedResource>(resource: &mut R) -> Option<&mut dyn CountedItems> {
    Some(resource)
}

/// Main API client
#[derive(Clone)]
pub struct Client {
    pub config: ClientConfig,
    pub http: HttpTransport,
    endpoint: Url,
}

impl Client {
    /// Create a new client from validated configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;
        let http = HttpTransport::new(&config)?;

        Ok(Self { config, http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Last raw request/response pair. Last writer wins when the client is shared.
    pub fn last_exchange(&self) -> Exchange {
        self.http.last_exchange()
    }

    /// Build the full URL for a resource path
    pub fn url_for(&self, path: &str, search: Option<&dyn SearchParams>) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid path '{}': {}", path, e)))?;

        if let Some(search) = search {
            let pairs = search.to_query()?;
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }
        Ok(url)
    }

    /// Perform `action` on `resource`.
    ///
    /// Contract errors (no route, body on a bodyless action, bad search
    /// parameters) are returned before any network I/O. On success the decoded
    /// payload has been written into `resource` and its `init` hook has run.
    ///
    /// List and count payloads reach `resource` through
    /// [`Resource::as_list_mut`] and [`Resource::as_counted_mut`]; prefer
    /// [`Client::list`] and [`Client::count`], which need no override.
    pub async fn dispatch<R: Resource>(
        &self,
        resource: &mut R,
        action: Action,
        body: Option<&dyn EncodeBody>,
        search: Option<&dyn SearchParams>,
    ) -> Result<Receipt> {
        self.dispatch_with(resource, action, body, search, Capabilities::queried())
            .await
    }

    async fn dispatch_with<R: Resource>(
        &self,
        resource: &mut R,
        action: Action,
        body: Option<&dyn EncodeBody>,
        search: Option<&dyn SearchParams>,
        caps: Capabilities<R>,
    ) -> Result<Receipt> {
        let Some(route) = resource.route(action) else {
            return Err(Error::Unsupported {
                action,
                resource: resource.name().to_string(),
            });
        };

        if action == Action::Count && (caps.counted)(resource).is_none() {
            return Err(Error::NotCountable(resource.name().to_string()));
        }

        let url = self.url_for(&route.path, search)?;

        let body = match (body, action.body_namespace()) {
            (None, _) => None,
            (Some(_), None) => return Err(Error::BodyNotAllowed(action)),
            (Some(body), Some(ns)) => {
                let value = body.encode_body(ns)?;
                Some(serde_json::to_vec(&value).map_err(|e| Error::codec(ns, e))?)
            },
        };

        tracing::debug!("dispatch: {} {}/{} -> {} {}", action, resource.group(), resource.name(), route.method, url);

        let response = self.http.send(route.method, url, body).await?;
        if response.status >= 400 {
            return Err(parse_error(response.status, &response.body));
        }

        let mut envelope = Envelope::parse(response.status, &response.body)?;
        decode_envelope(resource, action, &caps, &mut envelope)?;

        Ok(Receipt {
            request_id: envelope.request_id,
            status: response.status,
            job_url: envelope.jobs_url,
        })
    }

    /// Create `resource`, sending its create-tagged fields.
    pub async fn create<R: Resource>(&self, resource: &mut R) -> Result<Receipt> {
        let body = resource.clone();
        self.dispatch(resource, Action::Create, Some(&body), None).await
    }

    /// Refresh `resource` from the server.
    pub async fn read<R: Resource>(&self, resource: &mut R) -> Result<Receipt> {
        self.dispatch(resource, Action::Read, None, None).await
    }

    /// Send the update-tagged fields of `resource`.
    pub async fn update<R: Resource>(&self, resource: &mut R) -> Result<Receipt> {
        let body = resource.clone();
        self.dispatch(resource, Action::Update, Some(&body), None).await
    }

    /// Declaratively apply `resource`, sending its apply-tagged fields.
    pub async fn apply<R: Resource>(&self, resource: &mut R) -> Result<Receipt> {
        let body = resource.clone();
        self.dispatch(resource, Action::Apply, Some(&body), None).await
    }

    pub async fn delete<R: Resource>(&self, resource: &mut R) -> Result<Receipt> {
        self.dispatch(resource, Action::Delete, None, None).await
    }

    pub async fn cancel<R: Resource>(&self, resource: &mut R) -> Result<Receipt> {
        self.dispatch(resource, Action::Cancel, None, None).await
    }

    /// Fetch one page into the item collection of `resource`.
    pub async fn list<R: ListResource>(&self, resource: &mut R, search: Option<&dyn SearchParams>) -> Result<Receipt> {
        self.dispatch_with(resource, Action::List, None, search, Capabilities::listed())
            .await
    }

    /// Fetch the remote item count into `resource`.
    pub async fn count<R: CountedResource>(&self, resource: &mut R, search: Option<&dyn SearchParams>) -> Result<Receipt> {
        self.dispatch_with(resource, Action::Count, None, search, Capabilities::counted_list())
            .await
    }
}

/// Write the envelope payload into `resource`, then run its init hook.
fn decode_envelope<R: Resource>(
    resource: &mut R,
    action: Action,
    caps: &Capabilities<R>,
    envelope: &mut Envelope,
) -> Result<()> {
    if action == Action::Count {
        let count = envelope
            .count()
            .ok_or_else(|| Error::UnexpectedShape("count response without result.count".to_string()))?;
        let name = resource.name().to_string();
        (caps.counted)(resource).ok_or(Error::NotCountable(name))?.record_count(count);
        // The count lives in `result`; only `results` can still carry items.
        envelope.result = None;
    }

    let decoded = match envelope.take_payload()? {
        Payload::Single(value) => {
            decode_into(resource, value, Namespace::Read)?;
            true
        },
        Payload::Multi(items) => {
            let name = resource.name().to_string();
            let list = (caps.list)(resource).ok_or(Error::NotListable(name))?;
            list.replace_from_wire(items)?;
            tracing::trace!("decoded {} items", list.wire_item_count());
            true
        },
        Payload::None => action == Action::Count,
    };

    if decoded {
        resource.init();
    }
    Ok(())
}
