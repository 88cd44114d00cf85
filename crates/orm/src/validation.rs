//! Pre-save validation hook
//!
//! A [`Validator`] inspects a model before the `validate_and_*` family of
//! [`Connection`] methods persists it. Failing values come back as
//! [`ValidationErrors`]; an `Err` means the validator itself could not run.

use async_trait::async_trait;
use rowbound_validation::{Rules, ValidationErrors};

use crate::connection::Connection;
use crate::error::OrmResult;
use crate::model::Model;

#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate the model; the connection is available for lookups
    async fn validate(&self, model: &Model<'_>, conn: &Connection) -> OrmResult<ValidationErrors>;

    async fn validate_create(&self, model: &Model<'_>, conn: &Connection) -> OrmResult<ValidationErrors> {
        self.validate(model, conn).await
    }

    async fn validate_update(&self, model: &Model<'_>, conn: &Connection) -> OrmResult<ValidationErrors> {
        self.validate(model, conn).await
    }

    async fn validate_save(&self, model: &Model<'_>, conn: &Connection) -> OrmResult<ValidationErrors> {
        self.validate(model, conn).await
    }
}

/// Field rules run against every field value, transient ones included
#[async_trait]
impl Validator for Rules {
    async fn validate(&self, model: &Model<'_>, _conn: &Connection) -> OrmResult<ValidationErrors> {
        let values = model.to_json_map();
        Ok(Rules::validate(self, &values).await?)
    }
}
