//! Rate limit counter entity for SeaORM.

use sea_orm::entity::prelude::*;

use tally_core::{CounterRecord, StoreError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rate_limits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub key: String,
    pub count: i64,
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to the domain record.
impl TryFrom<Model> for CounterRecord {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let count = u64::try_from(model.count).map_err(|_| {
            StoreError::Corrupt(format!("negative count {} for key {}", model.count, model.key))
        })?;

        Ok(Self {
            key: model.key,
            count,
            expires_at: model.expires_at.into(),
        })
    }
}
