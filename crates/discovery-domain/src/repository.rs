//! Company hydration and the append-only unknown-extraction log (§3
//! "Unknown-extraction log", §4.9 step 9, §6 "Relational schema").
//!
//! Grounded in `crates/master-data/src/customer/repository.rs` for the
//! join-query / trait-plus-Postgres-impl idiom, and
//! `crates/core/src/audit/repository.rs` for the raw upsert pattern used by
//! `PostgresUnknownExtractionLog::record`.

use crate::model::Company;
use crate::vocabulary::{SegmentKind, VocabularyEntry};
use async_trait::async_trait;
use discovery_core::DatabasePool;
use sqlx::PgPool;

/// Reads back full `Company` records by id, for the orchestrator's
/// hydration step. Implementations must not reorder: the caller
/// (`orchestrator::hydrate`) is responsible for restoring the engine's rank
/// order against whatever order the store returns rows in.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_ids(&self, ids: &[i64]) -> discovery_core::error::Result<Vec<Company>>;
}

pub struct PostgresCompanyRepository {
    pool: PgPool,
}

impl PostgresCompanyRepository {
    pub fn new(db: &DatabasePool) -> Self {
        Self { pool: db.pool().clone() }
    }
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    /// Joins `companies` against its location/funding-stage foreign keys and
    /// aggregates its four many-to-many vocabulary relations (§6 "Relational
    /// schema"). `= ANY($1)` intentionally does not preserve the order of
    /// `ids`; callers restore rank order themselves.
    async fn find_by_ids(&self, ids: &[i64]) -> discovery_core::error::Result<Vec<Company>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Company>(
            r#"
            SELECT
                c.id,
                c.company_name,
                c.description,
                c.website_url,
                c.employee_count,
                c.funding_amount,
                l.name AS location,
                fs.name AS funding_stage,
                fs.order_index AS stage_order,
                COALESCE(ind.names, ARRAY[]::text[]) AS industries,
                COALESCE(tm.names, ARRAY[]::text[]) AS target_markets,
                COALESCE(bm.names, ARRAY[]::text[]) AS business_models,
                COALESCE(rm.names, ARRAY[]::text[]) AS revenue_models
            FROM companies c
            LEFT JOIN locations l ON l.id = c.location_id
            LEFT JOIN funding_stages fs ON fs.id = c.funding_stage_id
            LEFT JOIN LATERAL (
                SELECT array_agg(i.name) AS names
                FROM company_industries ci JOIN industries i ON i.id = ci.industry_id
                WHERE ci.company_id = c.id
            ) ind ON true
            LEFT JOIN LATERAL (
                SELECT array_agg(t.name) AS names
                FROM company_target_markets ct JOIN target_markets t ON t.id = ct.target_market_id
                WHERE ct.company_id = c.id
            ) tm ON true
            LEFT JOIN LATERAL (
                SELECT array_agg(b.name) AS names
                FROM company_business_models cb JOIN business_models b ON b.id = cb.business_model_id
                WHERE cb.company_id = c.id
            ) bm ON true
            LEFT JOIN LATERAL (
                SELECT array_agg(r.name) AS names
                FROM company_revenue_models cr JOIN revenue_models r ON r.id = cr.revenue_model_id
                WHERE cr.company_id = c.id
            ) rm ON true
            WHERE c.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Records vocabulary misses surfaced by the Segment Canonicalizer / Filter
/// Extractor (§3 "Unknown-extraction log", §4.4 step 3). Never read on the
/// query path; exists purely so an (out-of-scope) admin review surface can
/// promote or ignore gaps later.
#[async_trait]
pub trait UnknownExtractionLog: Send + Sync {
    /// Upserts on `(raw_value, segment)`: increments `count` and refreshes
    /// `last_seen` if the pair already exists, otherwise inserts a new
    /// `pending` row.
    async fn record(&self, raw_value: &str, segment: SegmentKind) -> discovery_core::error::Result<()>;
}

pub struct PostgresUnknownExtractionLog {
    pool: PgPool,
}

impl PostgresUnknownExtractionLog {
    pub fn new(db: &DatabasePool) -> Self {
        Self { pool: db.pool().clone() }
    }
}

#[async_trait]
impl UnknownExtractionLog for PostgresUnknownExtractionLog {
    async fn record(&self, raw_value: &str, segment: SegmentKind) -> discovery_core::error::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO llm_extractions (raw_value, segment, count, first_seen, last_seen, status)
            VALUES ($1, $2, 1, now(), now(), 'pending')
            ON CONFLICT (raw_value, segment)
            DO UPDATE SET count = llm_extractions.count + 1, last_seen = now()
            "#,
        )
        .bind(raw_value)
        .bind(segment.as_segment().field_name())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Reads the read-only segment vocabularies for `GET /api/filter-options`
/// (§6) and for the Filter Extractor's funding-stage exact-match
/// validation (§4.1 "non-fuzzy segments").
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    async fn list(&self, kind: SegmentKind) -> discovery_core::error::Result<Vec<VocabularyEntry>>;
}

pub struct PostgresVocabularyRepository {
    pool: PgPool,
}

impl PostgresVocabularyRepository {
    pub fn new(db: &DatabasePool) -> Self {
        Self { pool: db.pool().clone() }
    }
}

#[async_trait]
impl VocabularyRepository for PostgresVocabularyRepository {
    async fn list(&self, kind: SegmentKind) -> discovery_core::error::Result<Vec<VocabularyEntry>> {
        let rows = sqlx::query_as::<_, VocabularyEntry>(
            r#"
            SELECT id, $1 AS kind, name, COALESCE(synonyms, ARRAY[]::text[]) AS synonyms, order_index
            FROM vocabulary_entries
            WHERE segment = $1
            ORDER BY name ASC
            "#,
        )
        .bind(kind.as_segment().field_name())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
