use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Typed CRUD access to one named table through the query builder.
pub struct Repository<T> {
    table_name: String,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table_name: table_name.into(),
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_optional(
        &self,
        filter_data: FilterData,
    ) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .select_optional(&self.pool)
            .await
    }

    pub async fn insert_one(&self, values: &Map<String, Value>) -> Result<T, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .insert_one(&self.pool, values)
            .await
    }

    /// Apply a partial update to every row the filter matches, returning
    /// the updated rows (possibly empty).
    pub async fn update_where(
        &self,
        filter_data: FilterData,
        values: &Map<String, Value>,
    ) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .update_all(&self.pool, values)
            .await
    }

    /// Delete every row the filter matches, returning the deleted rows.
    pub async fn delete_where(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .delete_all(&self.pool)
            .await
    }
}
