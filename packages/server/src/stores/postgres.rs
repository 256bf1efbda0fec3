//! Postgres implementations of the pipeline store contracts.
//!
//! Both idempotent inserts rely on `ON CONFLICT ... DO NOTHING`, so
//! concurrent groups can persist overlapping rows without coordination.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use aggregation::error::{PipelineError, Result};
use aggregation::traits::{PostingStore, UserStore};
use aggregation::types::{Criteria, ExperienceLevel, Posting, UserId};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a stored experience requirement onto the filter field.
///
/// `not_specified` (and anything unrecognized) means "no requirement", not
/// "require unspecified postings".
fn experience_from_stored(value: Option<&str>) -> Option<ExperienceLevel> {
    value
        .filter(|v| *v != "not_specified")
        .and_then(ExperienceLevel::from_str_opt)
}

fn criteria_from_row(row: &PgRow) -> Result<Criteria> {
    let keywords: Option<Vec<String>> = row.try_get("keywords").map_err(PipelineError::store)?;
    let locations: Option<Vec<String>> = row.try_get("locations").map_err(PipelineError::store)?;
    let salary_min: Option<i64> = row.try_get("salary_min").map_err(PipelineError::store)?;
    let salary_max: Option<i64> = row.try_get("salary_max").map_err(PipelineError::store)?;
    let experience: Option<String> = row
        .try_get("experience_level")
        .map_err(PipelineError::store)?;
    let sources: Option<Vec<String>> = row.try_get("sources").map_err(PipelineError::store)?;

    Ok(Criteria {
        keywords: keywords.unwrap_or_default(),
        locations: locations.unwrap_or_default(),
        salary_min,
        salary_max,
        experience: experience_from_stored(experience.as_deref()),
        sources: sources.unwrap_or_default(),
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_active_user_ids(&self) -> Result<Vec<UserId>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM users WHERE is_active = TRUE ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(PipelineError::store)
    }

    async fn get_filter(&self, user_id: UserId) -> Result<Option<Criteria>> {
        let row = sqlx::query(
            "SELECT keywords, locations, salary_min, salary_max, experience_level, sources \
             FROM user_filters WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(PipelineError::store)?;

        row.map(|row| criteria_from_row(&row)).transpose()
    }

    async fn has_been_sent(&self, user_id: UserId, posting_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM sent_vacancies WHERE user_id = $1 AND vacancy_id = $2")
            .bind(user_id)
            .bind(posting_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PipelineError::store)?;

        Ok(row.is_some())
    }

    async fn mark_sent(&self, user_id: UserId, posting_id: &str, title: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO sent_vacancies (user_id, vacancy_id, vacancy_title) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, vacancy_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(posting_id)
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(PipelineError::store)?;

        Ok(())
    }
}

#[async_trait]
impl PostingStore for PgStore {
    async fn insert_if_absent(&self, posting: &Posting) -> Result<Option<i64>> {
        let row_id: Option<i32> = sqlx::query_scalar(
            "INSERT INTO vacancies \
             (vacancy_id, title, company, location, salary_min, salary_max, \
              experience_level, description, url, source, published_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (vacancy_id) DO NOTHING \
             RETURNING id",
        )
        .bind(&posting.external_id)
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.location)
        .bind(posting.salary_min)
        .bind(posting.salary_max)
        .bind(posting.experience.as_str())
        .bind(&posting.description)
        .bind(&posting.url)
        .bind(&posting.source)
        .bind(posting.published_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(PipelineError::store)?;

        Ok(row_id.map(i64::from))
    }
}
