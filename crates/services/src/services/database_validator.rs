//! Schema checks run at startup and by the readiness probe.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

/// Tables the API reads or writes; anything missing means migrations drifted.
pub const REQUIRED_TABLES: [(&str, &str); 14] = [
    ("auth", "users"),
    ("tenants", "business"),
    ("tenants", "subscriptions"),
    ("tenants", "vehicles"),
    ("tenants", "service_categories"),
    ("tenants", "services"),
    ("tenants", "service_tiers"),
    ("tenants", "tenant_images"),
    ("reputation", "reviews"),
    ("reputation", "review_votes"),
    ("website", "content"),
    ("booking", "bookings"),
    ("booking", "quotes"),
    ("schedule", "appointments"),
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct DatabaseValidator {
    pool: PgPool,
}

impl DatabaseValidator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        let migrations_table_exists = self.table_exists("public", "_sqlx_migrations").await?;
        if !migrations_table_exists {
            warn!("Database not initialized - _sqlx_migrations table does not exist");
            return Ok(ValidationResult {
                is_initialized: false,
                migrations_applied: 0,
                missing_tables: Vec::new(),
                warnings: vec!["Database has not been initialized. Run migrations.".to_string()],
            });
        }

        let migrations_applied =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
                .fetch_one(&self.pool)
                .await?;

        let missing_tables = self.missing_tables(&REQUIRED_TABLES).await?;
        let warnings: Vec<String> = missing_tables
            .iter()
            .map(|t| format!("missing table {t}"))
            .collect();
        for table in &missing_tables {
            warn!(table = %table, "Required table is missing");
        }

        info!(
            migrations_applied,
            missing_tables = missing_tables.len(),
            "Database validation complete"
        );

        Ok(ValidationResult {
            is_initialized: true,
            migrations_applied: migrations_applied.max(0) as usize,
            missing_tables,
            warnings,
        })
    }

    /// Qualified names (`schema.table`) of the tables that do not exist.
    pub async fn missing_tables(
        &self,
        required: &[(&str, &str)],
    ) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();
        for (schema, table) in required {
            if !self.table_exists(schema, table).await? {
                missing.push(format!("{schema}.{table}"));
            }
        }
        Ok(missing)
    }

    /// Description of the newest successfully applied migration.
    pub async fn latest_migration(&self) -> Result<Option<String>, DatabaseValidationError> {
        let migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(migration)
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                   SELECT 1 FROM information_schema.tables
                   WHERE table_schema = $1 AND table_name = $2
               )"#,
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_initialized: bool,
    pub migrations_applied: usize,
    pub missing_tables: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.missing_tables.is_empty() && self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.is_initialized {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.warnings.is_empty() {
            format!("Database validation warnings: {}", self.warnings.join(", "))
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}
