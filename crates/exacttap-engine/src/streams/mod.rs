//! Stream accessors.
//!
//! [`StreamKind`] is the closed set of streams this tap knows. Every kind
//! can identify its catalog entries, discover them and sync them.
//! [`REGISTRY`] fixes the order used for discovery and for identification
//! (first match wins). [`FOLD_EDGES`] declares streams that are never run on
//! their own but replicated by a carrier stream.

pub mod bookmark;
pub mod data_extension;
pub mod event;
pub mod list_subscriber;
pub mod object;
pub mod schema;

use std::fmt;

use exacttap_types::catalog::CatalogEntry;
use exacttap_types::error::AccessorError;
use exacttap_types::state::{StateScope, StreamName};

use crate::client::MarketingApi;
use crate::context::SyncContext;
use object::ObjectStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    Campaign,
    ContentArea,
    DataExtension,
    Email,
    Event,
    Folder,
    List,
    ListSend,
    ListSubscriber,
    Send,
    Subscriber,
}

/// Discovery and identification order.
pub const REGISTRY: [StreamKind; 11] = [
    StreamKind::Campaign,
    StreamKind::ContentArea,
    StreamKind::DataExtension,
    StreamKind::Email,
    StreamKind::Event,
    StreamKind::Folder,
    StreamKind::List,
    StreamKind::ListSend,
    StreamKind::ListSubscriber,
    StreamKind::Send,
    StreamKind::Subscriber,
];

/// `(folded, carrier)`: the folded stream is replicated by the carrier's
/// accessor and cannot be selected without it.
pub const FOLD_EDGES: &[(StreamKind, StreamKind)] =
    &[(StreamKind::Subscriber, StreamKind::ListSubscriber)];

impl StreamKind {
    /// Stream name, or the stream name prefix for data extensions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::ContentArea => "content_area",
            Self::DataExtension => "data_extension",
            Self::Email => "email",
            Self::Event => "event",
            Self::Folder => "folder",
            Self::List => "list",
            Self::ListSend => "list_send",
            Self::ListSubscriber => "list_subscriber",
            Self::Send => "send",
            Self::Subscriber => "subscriber",
        }
    }

    /// Descriptor for kinds backed by a single upstream object type.
    #[must_use]
    pub fn object(self) -> Option<&'static ObjectStream> {
        match self {
            Self::Campaign => Some(&object::CAMPAIGN),
            Self::ContentArea => Some(&object::CONTENT_AREA),
            Self::Email => Some(&object::EMAIL),
            Self::Folder => Some(&object::FOLDER),
            Self::List => Some(&object::LIST),
            Self::ListSend => Some(&object::LIST_SEND),
            Self::ListSubscriber => Some(&object::LIST_SUBSCRIBER),
            Self::Send => Some(&object::SEND),
            Self::Subscriber => Some(&object::SUBSCRIBER),
            Self::DataExtension | Self::Event => None,
        }
    }

    /// Whether `entry` belongs to this kind.
    #[must_use]
    pub fn matches_catalog(self, entry: &CatalogEntry) -> bool {
        match self {
            Self::DataExtension => entry.stream.starts_with(data_extension::STREAM_PREFIX),
            other => entry.stream == other.name(),
        }
    }

    /// First kind in [`REGISTRY`] order that claims `entry`.
    #[must_use]
    pub fn identify(entry: &CatalogEntry) -> Option<Self> {
        REGISTRY.into_iter().find(|kind| kind.matches_catalog(entry))
    }

    /// The carrier this kind is folded into, if any.
    #[must_use]
    pub fn carrier(self) -> Option<Self> {
        FOLD_EDGES
            .iter()
            .find(|(folded, _)| *folded == self)
            .map(|(_, carrier)| *carrier)
    }

    /// Discover this kind's catalog entries. Never reads state.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessorError`] if an upstream discovery call fails.
    pub async fn generate_catalog<A: MarketingApi>(
        self,
        api: &A,
    ) -> Result<Vec<CatalogEntry>, AccessorError> {
        match self {
            Self::DataExtension => data_extension::discover(api).await,
            Self::Event => Ok(vec![event::catalog_entry_for_events()]),
            other => Ok(other
                .object()
                .map(ObjectStream::catalog_entry)
                .into_iter()
                .collect()),
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stream kind bound to its catalog entry for one sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamAccessor {
    kind: StreamKind,
    catalog: CatalogEntry,
    folded: Vec<CatalogEntry>,
}

impl StreamAccessor {
    #[must_use]
    pub fn new(kind: StreamKind, catalog: CatalogEntry) -> Self {
        Self {
            kind,
            catalog,
            folded: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogEntry {
        &self.catalog
    }

    /// State key this accessor owns.
    #[must_use]
    pub fn stream_name(&self) -> StreamName {
        StreamName::new(self.catalog.stream.clone())
    }

    /// Hand a folded stream's catalog entry to this carrier.
    pub fn fold(&mut self, entry: CatalogEntry) {
        self.folded.push(entry);
    }

    #[must_use]
    pub fn replicate_subscriber(&self) -> bool {
        self.subscriber_catalog().is_some()
    }

    #[must_use]
    pub fn subscriber_catalog(&self) -> Option<&CatalogEntry> {
        self.folded
            .iter()
            .find(|entry| StreamKind::Subscriber.matches_catalog(entry))
    }

    /// Replicate this stream, updating `scope` with the new bookmark.
    ///
    /// Returns the number of records emitted across every stream this
    /// accessor writes.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessorError`] on upstream or output failure. `scope`
    /// may then hold a partial update and must be discarded.
    pub async fn sync<A: MarketingApi>(
        &self,
        ctx: &mut SyncContext<'_, A>,
        scope: &mut StateScope,
    ) -> Result<u64, AccessorError> {
        match self.kind {
            StreamKind::DataExtension => data_extension::sync(ctx, &self.catalog, scope).await,
            StreamKind::Event => event::sync(ctx, &self.catalog, scope).await,
            StreamKind::ListSubscriber => {
                list_subscriber::sync(ctx, &self.catalog, self.subscriber_catalog(), scope).await
            }
            StreamKind::Subscriber => Err(AccessorError::config(
                "FOLDED_STREAM",
                "subscriber is only replicated through list_subscriber",
            )),
            other => match other.object() {
                Some(descriptor) => object::sync(ctx, &self.catalog, descriptor, scope).await,
                None => Err(AccessorError::internal(
                    "NO_DESCRIPTOR",
                    format!("no object descriptor for `{other}`"),
                )),
            },
        }
    }
}
