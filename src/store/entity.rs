//! Typed CRUD over one collection with remote-first, local-fallback policy.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{Backends, Filter, Record};

/// Fields a patch may never overwrite.
const IMMUTABLE_FIELDS: [&str; 2] = ["id", "created_at"];

/// Store for one record type.
///
/// Remote failures degrade to the local backend:
/// reads and deletes always, inserts always, and updates only when the
/// local backend holds the id. A write the remote accepted never degrades,
/// even when its echoed row cannot be decoded, so no write is ever
/// mirrored to both backends.
pub struct EntityStore<T: Record> {
    backends: Arc<Backends>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            backends: self.backends.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> EntityStore<T> {
    pub(crate) fn new(backends: Arc<Backends>) -> Self {
        Self {
            backends,
            _record: PhantomData,
        }
    }

    /// All records matching `filter`, newest first.
    pub async fn list(&self, filter: Option<Filter>) -> AppResult<Vec<T>> {
        if let Some(remote) = &self.backends.remote {
            let answer = remote
                .select(T::COLLECTION, filter.as_ref(), T::ORDER_FIELD)
                .await
                .and_then(decode_remote_rows::<T>);
            match answer {
                Ok(mut records) => {
                    sort_newest_first(&mut records);
                    return Ok(records);
                }
                Err(e) => warn!(
                    collection = T::COLLECTION,
                    error = %e,
                    "Remote list failed, answering from local collection"
                ),
            }
        }

        self.local_list(filter.as_ref()).await
    }

    /// Point lookup; absent is not an error.
    pub async fn get(&self, id: &str) -> AppResult<Option<T>> {
        if let Some(remote) = &self.backends.remote {
            let answer = remote
                .select_by_id(T::COLLECTION, id)
                .await
                .and_then(|row| row.map(decode_remote_row::<T>).transpose());
            match answer {
                Ok(record) => return Ok(record),
                Err(e) => warn!(
                    collection = T::COLLECTION,
                    id,
                    error = %e,
                    "Remote get failed, answering from local collection"
                ),
            }
        }

        Ok(self
            .local_list(None)
            .await?
            .into_iter()
            .find(|record| record.id() == id))
    }

    /// Insert a new record; the backend assigns id and timestamps.
    pub async fn insert(&self, new: &T::New) -> AppResult<T> {
        let row = serde_json::to_value(new)
            .map_err(|e| AppError::InvalidInput(format!("Unencodable record: {}", e)))?;

        if let Some(remote) = &self.backends.remote {
            match remote.insert(T::COLLECTION, row.clone()).await {
                // The remote committed the row; a bad echo must not add a local copy
                Ok(stored) => return decode_remote_row::<T>(stored),
                Err(e) => warn!(
                    collection = T::COLLECTION,
                    error = %e,
                    "Remote insert failed, writing to local collection only"
                ),
            }
        }

        self.local_insert(row).await
    }

    /// Merge `patch` into the record with `id`; `None` when the id is unknown.
    ///
    /// `id` and `created_at` in the patch are ignored. Records carrying
    /// `updated_at` get it refreshed.
    pub async fn update<P: Serialize + ?Sized>(&self, id: &str, patch: &P) -> AppResult<Option<T>> {
        let fields = patch_fields::<T, P>(patch)?;

        if let Some(remote) = &self.backends.remote {
            match remote
                .update(T::COLLECTION, id, JsonValue::Object(fields.clone()))
                .await
            {
                Ok(row) => return row.map(decode_remote_row::<T>).transpose(),
                Err(remote_err) => {
                    warn!(
                        collection = T::COLLECTION,
                        id,
                        error = %remote_err,
                        "Remote update failed, trying local collection"
                    );
                    return match self.local_update(id, fields).await? {
                        Some(record) => Ok(Some(record)),
                        None => Err(remote_err),
                    };
                }
            }
        }

        self.local_update(id, fields).await
    }

    /// Remove the record; unknown ids are not an error.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if let Some(remote) = &self.backends.remote {
            match remote.delete(T::COLLECTION, id).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!(
                    collection = T::COLLECTION,
                    id,
                    error = %e,
                    "Remote delete failed, deleting from local collection"
                ),
            }
        }

        self.local_delete(id).await
    }

    async fn local_list(&self, filter: Option<&Filter>) -> AppResult<Vec<T>> {
        let rows = self.backends.local.snapshot(T::COLLECTION).await?;
        let mut records = rows
            .into_iter()
            .filter(|row| filter.is_none_or(|f| f.matches(row)))
            .map(decode_local_row::<T>)
            .collect::<AppResult<Vec<T>>>()?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn local_insert(&self, row: JsonValue) -> AppResult<T> {
        let JsonValue::Object(mut fields) = row else {
            return Err(AppError::InvalidInput(format!(
                "{} payload must be an object",
                T::COLLECTION
            )));
        };

        let now = JsonValue::String(Utc::now().to_rfc3339());
        fields.insert("id".to_string(), JsonValue::String(Uuid::now_v7().to_string()));
        fields.insert("created_at".to_string(), now.clone());
        if T::HAS_UPDATED_AT {
            fields.insert("updated_at".to_string(), now);
        }

        let row = JsonValue::Object(fields);
        let record = decode_local_row::<T>(row.clone())?;

        self.backends
            .local
            .mutate(T::COLLECTION, move |rows| {
                rows.insert(0, row);
                Ok(Some(()))
            })
            .await?;

        Ok(record)
    }

    async fn local_update(&self, id: &str, fields: Map<String, JsonValue>) -> AppResult<Option<T>> {
        self.backends
            .local
            .mutate(T::COLLECTION, |rows| {
                let Some(row) = rows
                    .iter_mut()
                    .find(|row| row.get("id").and_then(JsonValue::as_str) == Some(id))
                else {
                    return Ok(None);
                };

                let mut merged = row.clone();
                if let JsonValue::Object(target) = &mut merged {
                    target.extend(fields);
                }
                let record = decode_local_row::<T>(merged.clone())?;
                *row = merged;
                Ok(Some(record))
            })
            .await
    }

    async fn local_delete(&self, id: &str) -> AppResult<()> {
        self.backends
            .local
            .mutate(T::COLLECTION, |rows| {
                let before = rows.len();
                rows.retain(|row| row.get("id").and_then(JsonValue::as_str) != Some(id));
                Ok((rows.len() != before).then_some(()))
            })
            .await?;
        Ok(())
    }
}

fn patch_fields<T: Record, P: Serialize + ?Sized>(patch: &P) -> AppResult<Map<String, JsonValue>> {
    let JsonValue::Object(mut fields) = serde_json::to_value(patch)? else {
        return Err(AppError::InvalidInput(
            "update payload must be an object".to_string(),
        ));
    };

    for field in IMMUTABLE_FIELDS {
        fields.remove(field);
    }
    if T::HAS_UPDATED_AT {
        fields.insert(
            "updated_at".to_string(),
            JsonValue::String(Utc::now().to_rfc3339()),
        );
    }

    Ok(fields)
}

/// Stable sort, newest first by the record's ordering timestamp.
fn sort_newest_first<T: Record>(records: &mut [T]) {
    records.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
}

fn decode_remote_rows<T: Record>(rows: Vec<JsonValue>) -> AppResult<Vec<T>> {
    rows.into_iter().map(decode_remote_row::<T>).collect()
}

fn decode_remote_row<T: Record>(row: JsonValue) -> AppResult<T> {
    serde_json::from_value(row).map_err(|e| {
        AppError::Remote(format!("Undecodable {} row: {}", T::COLLECTION, e))
    })
}

fn decode_local_row<T: Record>(row: JsonValue) -> AppResult<T> {
    serde_json::from_value(row).map_err(|e| {
        AppError::LocalStore(format!("Undecodable {} row: {}", T::COLLECTION, e))
    })
}
