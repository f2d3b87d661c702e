//! # REST Remote Store
//!
//! [`RemoteStore`] over the hosted backend's PostgREST-style table API.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    {base}/rest/v1/training_days?select=*&user_id=eq.U&date=eq.D   │
//! │  POST   {base}/rest/v1/exercise_sets          body: [{..}, {..}]        │
//! │  PATCH  {base}/rest/v1/day_exercises?id=eq.X  body: {changed fields}    │
//! │  DELETE {base}/rest/v1/exercises?id=eq.X                               │
//! │                                                                         │
//! │  Headers:  apikey: <anon key>                                          │
//! │            Authorization: Bearer <access token>                        │
//! │            Prefer: return=representation   (writes)                    │
//! │                                                                         │
//! │  Status:   2xx ok │ 409 Conflict │ 401/403 Unauthorized                │
//! │            502/503/504 Unavailable │ other Backend                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every written row carries the configured `user_id`.

use async_trait::async_trait;
use chrono::NaiveDate;
use ironlog_core::{
    DayExercise, DayExerciseRepository, DayExerciseUpdate, ExerciseDefinition,
    ExerciseDefinitionUpdate, ExerciseRepository, ExerciseSet, ExerciseSetRepository,
    ExerciseSetUpdate, NewDayExercise, NewExerciseDefinition, NewExerciseSet, NewTrainingDay,
    Record, RemoteStore, StoreError, StoreResult, TrainingDay, TrainingDayRepository,
    TrainingDayUpdate,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::config::RemoteSettings;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// HTTP Client
// =============================================================================

#[derive(Debug)]
struct RestClient {
    http: reqwest::Client,
    /// `{base}/rest/v1`, no trailing slash.
    base_url: String,
    anon_key: String,
    bearer: String,
    user_id: String,
}

/// Row body with the owner column added.
#[derive(Serialize)]
struct Owned<'a, B: Serialize> {
    #[serde(flatten)]
    row: &'a B,
    user_id: &'a str,
}

impl RestClient {
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.bearer)
    }

    fn owned<'a, B: Serialize>(&'a self, row: &'a B) -> Owned<'a, B> {
        Owned {
            row,
            user_id: &self.user_id,
        }
    }
}

fn network(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Maps non-2xx responses onto the store error contract.
async fn check(resp: Response, entity: &str) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), entity, body = %body, "Remote request rejected");

    Err(match status {
        StatusCode::CONFLICT => StoreError::conflict(entity, body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            StoreError::Unavailable(format!("{}: {}", status, body))
        }
        _ => StoreError::Backend(format!("{}: {}", status, body)),
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> StoreResult<Vec<T>> {
    resp.json::<Vec<T>>()
        .await
        .map_err(|e| StoreError::Backend(format!("Invalid response body: {}", e)))
}

// =============================================================================
// Table Access
// =============================================================================

/// Typed access to one remote table.
#[derive(Debug)]
struct RestTable<T> {
    client: Arc<RestClient>,
    table: &'static str,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for RestTable<T> {
    fn clone(&self) -> Self {
        RestTable {
            client: self.client.clone(),
            table: self.table,
            _row: PhantomData,
        }
    }
}

impl<T: Record + DeserializeOwned> RestTable<T> {
    fn new(client: Arc<RestClient>, table: &'static str) -> Self {
        RestTable {
            client,
            table,
            _row: PhantomData,
        }
    }

    /// Rows of the current user matching every `column = value` filter.
    async fn select(&self, filters: &[(&str, &str)], order: &str) -> StoreResult<Vec<T>> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("user_id".to_string(), format!("eq.{}", self.client.user_id)),
        ];
        for (column, value) in filters {
            query.push((column.to_string(), format!("eq.{}", value)));
        }
        query.push(("order".to_string(), format!("{}.asc", order)));

        let resp = self
            .client
            .request(Method::GET, self.table)
            .query(&query)
            .send()
            .await
            .map_err(network)?;

        decode(check(resp, T::ENTITY).await?).await
    }

    async fn find_all(&self, order: &str) -> StoreResult<Vec<T>> {
        self.select(&[], order).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self.select(&[("id", id)], "id").await?.into_iter().next())
    }

    async fn insert_many<B: Serialize>(&self, rows: &[B]) -> StoreResult<Vec<T>> {
        let body: Vec<_> = rows.iter().map(|row| self.client.owned(row)).collect();
        debug!(table = self.table, count = body.len(), "Inserting remote rows");

        let resp = self
            .client
            .request(Method::POST, self.table)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(network)?;

        decode(check(resp, T::ENTITY).await?).await
    }

    async fn insert<B: Serialize>(&self, row: &B) -> StoreResult<T> {
        self.insert_many(std::slice::from_ref(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("{} insert returned no row", self.table)))
    }

    async fn update<B: Serialize>(&self, id: &str, patch: &B, empty: bool) -> StoreResult<T> {
        if empty {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| StoreError::not_found(T::ENTITY, id));
        }

        let resp = self
            .client
            .request(Method::PATCH, self.table)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(network)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(T::ENTITY, id));
        }

        decode(check(resp, T::ENTITY).await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let resp = self
            .client
            .request(Method::DELETE, self.table)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(network)?;

        check(resp, T::ENTITY).await?;
        Ok(())
    }
}

// =============================================================================
// Remote Store
// =============================================================================

/// Remote store speaking to the hosted backend over HTTP.
///
/// ## Usage
/// ```rust,ignore
/// let remote = RestRemote::new(&config.remote)?;
/// let days = remote.training_days().find_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct RestRemote {
    exercises: RestExercises,
    training_days: RestTrainingDays,
    day_exercises: RestDayExercises,
    exercise_sets: RestExerciseSets,
}

impl RestRemote {
    /// Builds the client from remote settings.
    ///
    /// ## Errors
    /// * `InvalidConfig` - URL or user id missing
    /// * `InvalidUrl` - URL does not parse
    /// * `Http` - client could not be built
    pub fn new(settings: &RemoteSettings) -> SyncResult<Self> {
        let raw_url = settings
            .url
            .as_deref()
            .ok_or_else(|| SyncError::InvalidConfig("remote.url is not set".into()))?;
        let user_id = settings
            .user_id
            .clone()
            .ok_or_else(|| SyncError::InvalidConfig("remote.user_id is not set".into()))?;

        url::Url::parse(raw_url)?;
        let base_url = format!("{}/rest/v1", raw_url.trim_end_matches('/'));

        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        let client = Arc::new(RestClient {
            http,
            base_url,
            anon_key: settings.anon_key.clone(),
            bearer: settings
                .access_token
                .clone()
                .unwrap_or_else(|| settings.anon_key.clone()),
            user_id,
        });

        Ok(RestRemote {
            exercises: RestExercises(RestTable::new(client.clone(), "exercises")),
            training_days: RestTrainingDays(RestTable::new(client.clone(), "training_days")),
            day_exercises: RestDayExercises(RestTable::new(client.clone(), "day_exercises")),
            exercise_sets: RestExerciseSets(RestTable::new(client, "exercise_sets")),
        })
    }
}

impl RemoteStore for RestRemote {
    fn exercises(&self) -> &dyn ExerciseRepository {
        &self.exercises
    }

    fn training_days(&self) -> &dyn TrainingDayRepository {
        &self.training_days
    }

    fn day_exercises(&self) -> &dyn DayExerciseRepository {
        &self.day_exercises
    }

    fn exercise_sets(&self) -> &dyn ExerciseSetRepository {
        &self.exercise_sets
    }
}

// =============================================================================
// Per-entity Repositories
// =============================================================================

#[derive(Debug, Clone)]
pub struct RestExercises(RestTable<ExerciseDefinition>);

#[async_trait]
impl ExerciseRepository for RestExercises {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseDefinition>> {
        self.0.find_all("created_at").await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseDefinition>> {
        self.0.find_by_id(id).await
    }

    async fn create(&self, input: &NewExerciseDefinition) -> StoreResult<ExerciseDefinition> {
        self.0.insert(input).await
    }

    async fn update(
        &self,
        id: &str,
        update: &ExerciseDefinitionUpdate,
    ) -> StoreResult<ExerciseDefinition> {
        self.0.update(id, update, update.is_empty()).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.0.delete(id).await
    }
}

#[derive(Debug, Clone)]
pub struct RestTrainingDays(RestTable<TrainingDay>);

#[async_trait]
impl TrainingDayRepository for RestTrainingDays {
    async fn find_all(&self) -> StoreResult<Vec<TrainingDay>> {
        self.0.find_all("date").await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<TrainingDay>> {
        self.0.find_by_id(id).await
    }

    async fn find_by_date(&self, date: NaiveDate) -> StoreResult<Option<TrainingDay>> {
        let date = date.to_string();
        Ok(self
            .0
            .select(&[("date", date.as_str())], "date")
            .await?
            .into_iter()
            .next())
    }

    async fn create(&self, input: &NewTrainingDay) -> StoreResult<TrainingDay> {
        self.0.insert(input).await
    }

    async fn get_or_create(&self, input: &NewTrainingDay) -> StoreResult<(TrainingDay, bool)> {
        if let Some(existing) = self.find_by_date(input.date).await? {
            return Ok((existing, false));
        }

        match self.0.insert(input).await {
            Ok(created) => Ok((created, true)),
            // Another client created the date between our read and write
            Err(StoreError::Conflict { entity, detail }) => {
                match self.find_by_date(input.date).await? {
                    Some(existing) => Ok((existing, false)),
                    None => Err(StoreError::Conflict { entity, detail }),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, id: &str, update: &TrainingDayUpdate) -> StoreResult<TrainingDay> {
        self.0.update(id, update, update.is_empty()).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.0.delete(id).await
    }
}

#[derive(Debug, Clone)]
pub struct RestDayExercises(RestTable<DayExercise>);

#[async_trait]
impl DayExerciseRepository for RestDayExercises {
    async fn find_all(&self) -> StoreResult<Vec<DayExercise>> {
        self.0.find_all("created_at").await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<DayExercise>> {
        self.0.find_by_id(id).await
    }

    async fn find_by_parent_id(&self, training_day_id: &str) -> StoreResult<Vec<DayExercise>> {
        self.0
            .select(&[("training_day_id", training_day_id)], "display_order")
            .await
    }

    async fn create(&self, input: &NewDayExercise) -> StoreResult<DayExercise> {
        self.0.insert(input).await
    }

    async fn update(&self, id: &str, update: &DayExerciseUpdate) -> StoreResult<DayExercise> {
        self.0.update(id, update, update.is_empty()).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.0.delete(id).await
    }
}

#[derive(Debug, Clone)]
pub struct RestExerciseSets(RestTable<ExerciseSet>);

#[async_trait]
impl ExerciseSetRepository for RestExerciseSets {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseSet>> {
        self.0.find_all("created_at").await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseSet>> {
        self.0.find_by_id(id).await
    }

    async fn find_by_parent_id(&self, day_exercise_id: &str) -> StoreResult<Vec<ExerciseSet>> {
        self.0
            .select(&[("day_exercise_id", day_exercise_id)], "set_order")
            .await
    }

    async fn create(&self, input: &NewExerciseSet) -> StoreResult<ExerciseSet> {
        self.0.insert(input).await
    }

    async fn bulk_create(
        &self,
        day_exercise_id: &str,
        inputs: &[NewExerciseSet],
    ) -> StoreResult<Vec<ExerciseSet>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<NewExerciseSet> = inputs
            .iter()
            .map(|input| NewExerciseSet {
                day_exercise_id: day_exercise_id.to_string(),
                ..input.clone()
            })
            .collect();
        self.0.insert_many(&rows).await
    }

    async fn update(&self, id: &str, update: &ExerciseSetUpdate) -> StoreResult<ExerciseSet> {
        self.0.update(id, update, update.is_empty()).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.0.delete(id).await
    }
}
