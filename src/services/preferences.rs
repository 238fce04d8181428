//! Small key-value preferences kept next to the cache.

use sqlx::SqlitePool;

use crate::db::queries;
use crate::errors::AppError;

const KEY_CURRENT_CITY: &str = "current_city";
const KEY_ASKED_LOCATION: &str = "asked_location";

#[derive(Debug, Clone)]
pub struct Preferences {
    pool: SqlitePool,
}

impl Preferences {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The city the user last viewed, if any.
    pub async fn current_city(&self) -> Result<Option<String>, AppError> {
        Ok(queries::get_preference(&self.pool, KEY_CURRENT_CITY).await?)
    }

    pub async fn save_current_city(&self, city: &str) -> Result<(), AppError> {
        Ok(queries::set_preference(&self.pool, KEY_CURRENT_CITY, city).await?)
    }

    pub async fn has_asked_location_permission(&self) -> Result<bool, AppError> {
        let value = queries::get_preference(&self.pool, KEY_ASKED_LOCATION).await?;
        Ok(value.as_deref() == Some("true"))
    }

    pub async fn set_asked_location_permission(&self) -> Result<(), AppError> {
        Ok(queries::set_preference(&self.pool, KEY_ASKED_LOCATION, "true").await?)
    }
}
