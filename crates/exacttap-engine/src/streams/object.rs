//! Plain upstream object streams and the shared pull/emit loop.

use exacttap_types::catalog::CatalogEntry;
use exacttap_types::error::AccessorError;
use exacttap_types::state::StateScope;
use serde_json::{json, Value};

use crate::client::{MarketingApi, RetrieveRequest, Row};
use crate::context::SyncContext;
use crate::streams::bookmark::{resume_point, BookmarkTracker};
use crate::streams::schema::{catalog_entry, FieldSpec, FieldType};

/// Static description of a stream backed by one upstream object type.
#[derive(Debug)]
pub struct ObjectStream {
    pub stream: &'static str,
    pub object_type: &'static str,
    pub key_properties: &'static [&'static str],
    pub replication_key: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

impl ObjectStream {
    #[must_use]
    pub fn catalog_entry(&self) -> CatalogEntry {
        catalog_entry(
            self.stream,
            self.fields.iter().copied(),
            self.key_properties,
            self.replication_key,
        )
    }

    pub(crate) fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|(name, _)| *name)
    }
}

use FieldType::{Boolean, DateTime, Integer, Object, String as Text};

pub static CAMPAIGN: ObjectStream = ObjectStream {
    stream: "campaign",
    object_type: "Campaign",
    key_properties: &["id"],
    replication_key: None,
    fields: &[
        ("id", Text),
        ("name", Text),
        ("description", Text),
        ("campaignCode", Text),
        ("color", Text),
        ("favorite", Boolean),
        ("createdDate", DateTime),
        ("modifiedDate", DateTime),
    ],
};

pub static CONTENT_AREA: ObjectStream = ObjectStream {
    stream: "content_area",
    object_type: "ContentArea",
    key_properties: &["ID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ID", Integer),
        ("CustomerKey", Text),
        ("Name", Text),
        ("CategoryID", Integer),
        ("Content", Text),
        ("IsBlank", Boolean),
        ("IsDynamicContent", Boolean),
        ("Layout", Text),
        ("ObjectID", Text),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static EMAIL: ObjectStream = ObjectStream {
    stream: "email",
    object_type: "Email",
    key_properties: &["ID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ID", Integer),
        ("Name", Text),
        ("Subject", Text),
        ("CategoryID", Integer),
        ("CharacterSet", Text),
        ("ContentCheckStatus", Text),
        ("CustomerKey", Text),
        ("EmailType", Text),
        ("HasDynamicSubjectLine", Boolean),
        ("HTMLBody", Text),
        ("TextBody", Text),
        ("IsHTMLPaste", Boolean),
        ("ObjectID", Text),
        ("Status", Text),
        ("SyncTextWithHTML", Boolean),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static FOLDER: ObjectStream = ObjectStream {
    stream: "folder",
    object_type: "DataFolder",
    key_properties: &["ID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ID", Integer),
        ("Name", Text),
        ("Description", Text),
        ("ContentType", Text),
        ("CustomerKey", Text),
        ("AllowChildren", Boolean),
        ("IsActive", Boolean),
        ("IsEditable", Boolean),
        ("ObjectID", Text),
        ("ParentFolder", Object),
        ("Type", Text),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static LIST: ObjectStream = ObjectStream {
    stream: "list",
    object_type: "List",
    key_properties: &["ID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ID", Integer),
        ("ListName", Text),
        ("Description", Text),
        ("Category", Integer),
        ("CustomerKey", Text),
        ("ListClassification", Text),
        ("ObjectID", Text),
        ("Type", Text),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static LIST_SEND: ObjectStream = ObjectStream {
    stream: "list_send",
    object_type: "ListSend",
    key_properties: &["ListID", "SendID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ListID", Integer),
        ("SendID", Integer),
        ("Duplicates", Integer),
        ("ExistingUndeliverables", Integer),
        ("ExistingUnsubscribes", Integer),
        ("ForwardedEmails", Integer),
        ("HardBounces", Integer),
        ("InvalidAddresses", Integer),
        ("MissingAddresses", Integer),
        ("NumberDelivered", Integer),
        ("NumberSent", Integer),
        ("OtherBounces", Integer),
        ("SoftBounces", Integer),
        ("UniqueClicks", Integer),
        ("UniqueOpens", Integer),
        ("Unsubscribes", Integer),
        ("ObjectID", Text),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static LIST_SUBSCRIBER: ObjectStream = ObjectStream {
    stream: "list_subscriber",
    object_type: "ListSubscriber",
    key_properties: &["SubscriberKey", "ListID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ID", Integer),
        ("ListID", Integer),
        ("SubscriberKey", Text),
        ("Status", Text),
        ("ObjectID", Text),
        ("UnsubscribedDate", DateTime),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static SEND: ObjectStream = ObjectStream {
    stream: "send",
    object_type: "Send",
    key_properties: &["ID"],
    replication_key: Some("ModifiedDate"),
    fields: &[
        ("ID", Integer),
        ("EmailName", Text),
        ("FromAddress", Text),
        ("FromName", Text),
        ("Subject", Text),
        ("Status", Text),
        ("IsAlwaysOn", Boolean),
        ("IsMultipart", Boolean),
        ("Duplicates", Integer),
        ("HardBounces", Integer),
        ("SoftBounces", Integer),
        ("OtherBounces", Integer),
        ("InvalidAddresses", Integer),
        ("ExistingUndeliverables", Integer),
        ("ExistingUnsubscribes", Integer),
        ("MissingAddresses", Integer),
        ("NumberDelivered", Integer),
        ("NumberErrored", Integer),
        ("NumberExcluded", Integer),
        ("NumberSent", Integer),
        ("NumberTargeted", Integer),
        ("UniqueClicks", Integer),
        ("UniqueOpens", Integer),
        ("Unsubscribes", Integer),
        ("SendDate", DateTime),
        ("SentDate", DateTime),
        ("CreatedDate", DateTime),
        ("ModifiedDate", DateTime),
    ],
};

pub static SUBSCRIBER: ObjectStream = ObjectStream {
    stream: "subscriber",
    object_type: "Subscriber",
    key_properties: &["ID"],
    replication_key: None,
    fields: &[
        ("ID", Integer),
        ("SubscriberKey", Text),
        ("EmailAddress", Text),
        ("EmailTypePreference", Text),
        ("Status", Text),
        ("PartnerKey", Text),
        ("Attributes", Object),
        ("UnsubscribedDate", DateTime),
        ("CreatedDate", DateTime),
    ],
};

/// Properties to request for `entry`: its selected fields, or every known
/// field when the catalog carries no property list.
pub(crate) fn requested_properties<'a>(
    entry: &CatalogEntry,
    known: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let selected = entry.schema.selected_properties();
    if entry.schema.properties.is_empty() {
        known.into_iter().map(str::to_string).collect()
    } else {
        selected.into_iter().map(str::to_string).collect()
    }
}

/// Fetch every row for `request`, let `enrich` adjust it, feed the tracker
/// and emit it as a record of `entry`. Returns the number of rows emitted.
pub(crate) async fn pull_and_emit<A, F>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    request: &RetrieveRequest,
    mut tracker: Option<&mut BookmarkTracker>,
    mut enrich: F,
) -> Result<u64, AccessorError>
where
    A: MarketingApi,
    F: FnMut(&mut Row),
{
    let rows = ctx.api.retrieve(request).await.map_err(|e| {
        AccessorError::from(e).with_details(json!({ "object_type": request.object_type }))
    })?;
    let mut emitted = 0;
    for mut row in rows {
        enrich(&mut row);
        if let Some(tracker) = tracker.as_deref_mut() {
            tracker.observe(&row);
        }
        ctx.write_record(entry, &row)?;
        emitted += 1;
    }
    Ok(emitted)
}

/// Incremental (or full-table, without a replication key) replication of
/// one object type into `entry`'s stream.
///
/// The bookmark is only written to `scope` once every row has been emitted.
pub(crate) async fn replicate<A, F>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    object_type: &str,
    properties: Vec<String>,
    replication_key: Option<&str>,
    scope: &mut StateScope,
    enrich: F,
) -> Result<u64, AccessorError>
where
    A: MarketingApi,
    F: FnMut(&mut Row),
{
    let request = RetrieveRequest::new(object_type, properties);

    let Some(replication_key) = replication_key else {
        tracing::debug!(stream = entry.stream, object_type, "Full-table read");
        return pull_and_emit(ctx, entry, &request, None, enrich).await;
    };

    let resumed_at = resume_point(&entry.stream, scope.bookmark_str(), ctx.config.start_date);
    let mut tracker = BookmarkTracker::new(replication_key, resumed_at);
    let request = request.with_filter(tracker.filter());
    tracing::debug!(
        stream = entry.stream,
        object_type,
        replication_key,
        since = ?request.filter.as_ref().map(|f| &f.value),
        "Incremental read"
    );

    let emitted = pull_and_emit(ctx, entry, &request, Some(&mut tracker), enrich).await?;
    if let Some(bookmark) = tracker.into_bookmark() {
        scope.set_bookmark(Value::String(bookmark));
    }
    Ok(emitted)
}

/// Sync a plain object stream.
pub async fn sync<A: MarketingApi>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    object: &ObjectStream,
    scope: &mut StateScope,
) -> Result<u64, AccessorError> {
    ctx.write_schema(entry)?;
    let properties = requested_properties(entry, object.field_names());
    let replication_key = entry.replication_key.as_deref().or(object.replication_key);
    replicate(
        ctx,
        entry,
        object.object_type,
        properties,
        replication_key,
        scope,
        |_| {},
    )
    .await
}
