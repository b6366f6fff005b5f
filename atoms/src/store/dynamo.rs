use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client as DynamoClient;

use super::{DocumentStore, ReportFilter, StoreError};
use crate::reports::Report;
use crate::users::User;

/// Partition key of both tables.
const KEY: &str = "id";

/// Image text stored per item. DynamoDB caps an item at 400 KB, so longer
/// images spill into chunk items keyed `<id>#image#<n>` in the Pothole table.
const IMAGE_CHUNK_BYTES: usize = 300 * 1024;

/// Total chunk count, kept on the report item. Absent means one.
const CHUNK_COUNT: &str = "image_chunks";

/// Set on chunk items only; names the owning report.
const CHUNK_OF: &str = "chunk_of";

type Item = HashMap<String, AttributeValue>;

/// DynamoDB backend. Each collection lives in its own table named
/// `<database>.<collection>`.
pub struct DynamoStore {
    client: DynamoClient,
    pothole_table: String,
    user_table: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, database_name: &str) -> Self {
        Self {
            client,
            pothole_table: format!("{}.Pothole", database_name),
            user_table: format!("{}.User", database_name),
        }
    }

    /// Create `table_name` with on-demand billing if it does not exist yet.
    async fn ensure_table(&self, table_name: &str) -> Result<(), StoreError> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_resource_not_found_exception())
                    .unwrap_or(false);
                if !missing {
                    return Err(backend_error("describe_table", e));
                }
            }
        }

        tracing::info!("Creating table {}", table_name);

        let key_attribute = AttributeDefinition::builder()
            .attribute_name(KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| backend_error("create_table", e))?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(KEY)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| backend_error("create_table", e))?;

        self.client
            .create_table()
            .table_name(table_name)
            .attribute_definitions(key_attribute)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| backend_error("create_table", e))?;

        Ok(())
    }

    /// Full scan, optionally narrowed by a filter expression. Follows every
    /// page so the result is the complete matching set.
    async fn scan(
        &self,
        table_name: &str,
        filter: Option<ScanFilter>,
    ) -> Result<Vec<Item>, StoreError> {
        let mut builder = self.client.scan().table_name(table_name);

        if let Some(filter) = filter {
            builder = builder.filter_expression(filter.expression);
            for (k, v) in filter.names {
                builder = builder.expression_attribute_names(k, v);
            }
            for (k, v) in filter.values {
                builder = builder.expression_attribute_values(k, v);
            }
        }

        builder
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| backend_error("scan", e))
    }

    async fn put(&self, table_name: &str, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| backend_error("put_item", e))?;
        Ok(())
    }

    async fn get(
        &self,
        table_name: &str,
        key: String,
        projection: Option<&str>,
    ) -> Result<Option<Item>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(table_name)
            .key(KEY, AttributeValue::S(key))
            .set_projection_expression(projection.map(str::to_string))
            .send()
            .await
            .map_err(|e| backend_error("get_item", e))?;

        Ok(result.item().cloned())
    }

    /// Chunk count of the stored report, 0 when there is none.
    async fn stored_chunk_count(&self, report_id: &str) -> Result<usize, StoreError> {
        Ok(self
            .get(&self.pothole_table, report_id.to_string(), Some(CHUNK_COUNT))
            .await?
            .map(|item| chunk_count(&item))
            .unwrap_or(0))
    }

    /// Write chunk items first and the report item last, so a reader never
    /// sees a count pointing at chunks that are not there yet. Chunks left
    /// over from a longer previous image are removed afterwards.
    async fn write_report(
        &self,
        report: &Report,
        previous_chunks: usize,
    ) -> Result<(), StoreError> {
        let (item, chunks) = report_to_items(report);
        let total = chunks.len() + 1;

        for chunk in chunks {
            self.put(&self.pothole_table, chunk).await?;
        }
        self.put(&self.pothole_table, item).await?;

        for n in total..previous_chunks {
            self.client
                .delete_item()
                .table_name(&self.pothole_table)
                .key(KEY, AttributeValue::S(chunk_key(&report.report_id, n)))
                .send()
                .await
                .map_err(|e| backend_error("delete_item", e))?;
        }
        Ok(())
    }

    /// Turn a report item back into a report, appending any spilled chunks.
    async fn load_report(&self, item: &Item) -> Result<Report, StoreError> {
        let mut report = report_from_item(item)?;

        for n in 1..chunk_count(item) {
            let chunk = self
                .get(&self.pothole_table, chunk_key(&report.report_id, n), None)
                .await?
                .and_then(|chunk| get_s(&chunk, "data"))
                .ok_or_else(|| StoreError::Malformed {
                    collection: "Pothole",
                    reason: format!("missing image chunk {} of {}", n, report.report_id),
                })?;
            report.image.push_str(&chunk);
        }
        Ok(report)
    }
}

struct ScanFilter {
    expression: String,
    names: Vec<(String, String)>,
    values: Vec<(String, AttributeValue)>,
}

impl ScanFilter {
    /// Chunk items carry neither `resolved` nor `submittedBy`, so only the
    /// unfiltered listing has to exclude them explicitly.
    fn for_reports(filter: &ReportFilter) -> Option<Self> {
        match filter {
            ReportFilter::All => Some(Self {
                expression: format!("attribute_not_exists({})", CHUNK_OF),
                names: vec![],
                values: vec![],
            }),
            ReportFilter::Resolved(resolved) => Some(Self {
                expression: "resolved = :resolved".to_string(),
                names: vec![],
                values: vec![(":resolved".to_string(), AttributeValue::Bool(*resolved))],
            }),
            ReportFilter::SubmittedBy(user) => Some(Self {
                expression: "submittedBy = :submitted_by".to_string(),
                names: vec![],
                values: vec![(":submitted_by".to_string(), AttributeValue::S(user.clone()))],
            }),
        }
    }

    fn for_credentials(name: &str, password: &str) -> Self {
        // Both attribute names are DynamoDB reserved words.
        Self {
            expression: "#name = :name AND #password = :password".to_string(),
            names: vec![
                ("#name".to_string(), "name".to_string()),
                ("#password".to_string(), "password".to_string()),
            ],
            values: vec![
                (":name".to_string(), AttributeValue::S(name.to_string())),
                (":password".to_string(), AttributeValue::S(password.to_string())),
            ],
        }
    }
}

fn backend_error<E>(operation: &'static str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::Backend {
        backend: "DynamoDB",
        operation,
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn get_s(item: &Item, field: &str) -> Option<String> {
    item.get(field).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

fn get_n<T: std::str::FromStr>(item: &Item, field: &str) -> Option<T> {
    item.get(field)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

/// DynamoDB numbers hold 38 significant digits; exponent form keeps any
/// finite `f64` within that.
fn number(value: f64) -> AttributeValue {
    AttributeValue::N(format!("{:e}", value))
}

fn chunk_key(report_id: &str, n: usize) -> String {
    format!("{}#image#{}", report_id, n)
}

fn chunk_count(item: &Item) -> usize {
    get_n::<usize>(item, CHUNK_COUNT).unwrap_or(1).max(1)
}

/// Split on char boundaries into pieces of at most [`IMAGE_CHUNK_BYTES`].
/// Always yields at least one piece.
fn split_image(image: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = image;
    while rest.len() > IMAGE_CHUNK_BYTES {
        let mut end = IMAGE_CHUNK_BYTES;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);
    chunks
}

/// The report item (holding the first image chunk) and one item per
/// further chunk.
fn report_to_items(report: &Report) -> (Item, Vec<Item>) {
    let chunks = split_image(&report.image);

    let mut item = HashMap::new();
    item.insert(KEY.to_string(), AttributeValue::S(report.report_id.clone()));
    item.insert("image".to_string(), AttributeValue::S(chunks[0].to_string()));
    item.insert(CHUNK_COUNT.to_string(), AttributeValue::N(chunks.len().to_string()));
    item.insert("latitude".to_string(), number(report.latitude));
    item.insert("longitude".to_string(), number(report.longitude));
    item.insert("resolved".to_string(), AttributeValue::Bool(report.resolved));
    item.insert("threat".to_string(), AttributeValue::N(report.threat.to_string()));

    // Absent text fields stay absent, matching documents saved without them.
    if let Some(address) = &report.address {
        item.insert("address".to_string(), AttributeValue::S(address.clone()));
    }
    if let Some(submitted_by) = &report.submitted_by {
        item.insert("submittedBy".to_string(), AttributeValue::S(submitted_by.clone()));
    }
    if let Some(comment) = &report.comment {
        item.insert("comment".to_string(), AttributeValue::S(comment.clone()));
    }

    let extra = chunks
        .iter()
        .enumerate()
        .skip(1)
        .map(|(n, chunk)| {
            HashMap::from([
                (KEY.to_string(), AttributeValue::S(chunk_key(&report.report_id, n))),
                (CHUNK_OF.to_string(), AttributeValue::S(report.report_id.clone())),
                ("data".to_string(), AttributeValue::S(chunk.to_string())),
            ])
        })
        .collect();

    (item, extra)
}

/// Report fields from the report item alone; `image` holds only the first
/// chunk.
fn report_from_item(item: &Item) -> Result<Report, StoreError> {
    let report_id = get_s(item, KEY).ok_or_else(|| StoreError::Malformed {
        collection: "Pothole",
        reason: "missing id".to_string(),
    })?;

    Ok(Report {
        report_id,
        image: get_s(item, "image").unwrap_or_default(),
        latitude: get_n(item, "latitude").unwrap_or_default(),
        longitude: get_n(item, "longitude").unwrap_or_default(),
        address: get_s(item, "address"),
        submitted_by: get_s(item, "submittedBy"),
        resolved: item
            .get("resolved")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        threat: get_n(item, "threat").unwrap_or(0),
        comment: get_s(item, "comment"),
    })
}

fn user_to_item(user: &User) -> Item {
    let mut item = HashMap::new();
    item.insert(KEY.to_string(), AttributeValue::S(user.user_id.clone()));
    if let Some(name) = &user.name {
        item.insert("name".to_string(), AttributeValue::S(name.clone()));
    }
    if let Some(password) = &user.password {
        item.insert("password".to_string(), AttributeValue::S(password.clone()));
    }
    if let Some(access) = &user.access {
        item.insert("access".to_string(), AttributeValue::S(access.clone()));
    }
    item
}

fn user_from_item(item: &Item) -> Result<User, StoreError> {
    let user_id = get_s(item, KEY).ok_or_else(|| StoreError::Malformed {
        collection: "User",
        reason: "missing id".to_string(),
    })?;

    Ok(User {
        user_id,
        name: get_s(item, "name"),
        password: get_s(item, "password"),
        access: get_s(item, "access"),
    })
}

#[async_trait]
impl DocumentStore for DynamoStore {
    fn backend_tag(&self) -> &'static str {
        "DynamoDB"
    }

    async fn connect(&self) -> Result<(), StoreError> {
        self.ensure_table(&self.pothole_table).await?;
        self.ensure_table(&self.user_table).await
    }

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        self.write_report(report, 0).await
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, StoreError> {
        match self.get(&self.pothole_table, report_id.to_string(), None).await? {
            Some(item) if !item.contains_key(CHUNK_OF) => {
                Ok(Some(self.load_report(&item).await?))
            }
            _ => Ok(None),
        }
    }

    async fn save_report(&self, report: &Report) -> Result<(), StoreError> {
        let previous_chunks = self.stored_chunk_count(&report.report_id).await?;
        self.write_report(report, previous_chunks).await
    }

    async fn find_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError> {
        let items = self
            .scan(&self.pothole_table, ScanFilter::for_reports(filter))
            .await?;

        let mut reports = Vec::with_capacity(items.len());
        for item in &items {
            reports.push(self.load_report(item).await?);
        }
        Ok(reports)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.put(&self.user_table, user_to_item(user)).await
    }

    async fn find_user(&self, name: &str, password: &str) -> Result<Option<User>, StoreError> {
        self.scan(
            &self.user_table,
            Some(ScanFilter::for_credentials(name, password)),
        )
        .await?
        .first()
        .map(user_from_item)
        .transpose()
    }
}
