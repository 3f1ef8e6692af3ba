//! Company structure: divisions, departments, grades, positions and sites
//!
//! These are plain catalogues; every store lists alphabetically by name.

use serde::Serialize;

use crate::accessor::{EntityAccessor, StoreContext};
use crate::error::Result;
use crate::models::{Department, Division, Grade, Position, RecordId, Site};
use crate::query::{QueryFilters, QueryOptions, SortDirection};
use crate::scope::EntityConfig;
use crate::state::OperationResult;

macro_rules! catalog_store {
    ($(#[$meta:meta])* $store:ident, $record:ty, $table:literal, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $store {
            accessor: EntityAccessor<$record>,
        }

        impl $store {
            #[must_use]
            pub fn config() -> EntityConfig {
                EntityConfig::new($table, $label).company_scoped()
            }

            #[must_use]
            pub fn new(context: &StoreContext) -> Self {
                Self {
                    accessor: EntityAccessor::new(context, Self::config()),
                }
            }

            #[must_use]
            pub const fn accessor(&self) -> &EntityAccessor<$record> {
                &self.accessor
            }

            #[must_use]
            pub fn items(&self) -> Vec<$record> {
                self.accessor.items()
            }

            /// Every entry of the company, by name
            pub async fn fetch_all(&self) -> Vec<$record> {
                self.accessor
                    .fetch_items_with_query(QueryFilters::new(), by_name())
                    .await
            }

            pub async fn fetch(&self, id: RecordId) -> Option<$record> {
                self.accessor.fetch_item(id).await
            }

            /// # Errors
            /// Returns an error if no company is known
            pub async fn create<P>(&self, payload: &P) -> Result<OperationResult<$record>>
            where
                P: Serialize + Sync + ?Sized,
            {
                self.accessor.create_item(payload).await
            }

            /// # Errors
            /// Returns an error if no company is known
            pub async fn update<P>(&self, id: RecordId, changes: &P) -> Result<OperationResult<$record>>
            where
                P: Serialize + Sync + ?Sized,
            {
                self.accessor.update_item(id, changes).await
            }

            /// # Errors
            /// Returns an error if no company is known
            pub async fn delete(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
                self.accessor.delete_item(id).await
            }
        }
    };
}

fn by_name() -> QueryOptions {
    QueryOptions::new().order_by("name", SortDirection::Asc)
}

catalog_store!(DivisionStore, Division, "divisions", "Division");
catalog_store!(DepartmentStore, Department, "departments", "Department");
catalog_store!(GradeStore, Grade, "grades", "Grade");
catalog_store!(PositionStore, Position, "positions", "Position");
catalog_store!(
    /// Work sites attendance can be recorded at
    SiteStore,
    Site,
    "sites",
    "Site"
);

impl DepartmentStore {
    /// Departments of one division, by name
    pub async fn fetch_by_division(&self, division_id: RecordId) -> Vec<Department> {
        let filters = QueryFilters::builder().eq("division_id", division_id).build();
        self.accessor.fetch_items_with_query(filters, by_name()).await
    }
}

impl PositionStore {
    /// Positions of one department, by name
    pub async fn fetch_by_department(&self, department_id: RecordId) -> Vec<Position> {
        let filters = QueryFilters::builder()
            .eq("department_id", department_id)
            .build();
        self.accessor.fetch_items_with_query(filters, by_name()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_context, tenant_identity};
    use serde_json::json;

    #[tokio::test]
    async fn test_catalogue_is_alphabetical_and_tenant_bound() {
        let context = memory_context(tenant_identity(42)).await;
        let store = DepartmentStore::new(&context);
        for name in ["Sales", "Engineering", "Operations"] {
            store.create(&json!({"name": name})).await.unwrap();
        }

        let names: Vec<_> = store
            .fetch_all()
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Engineering", "Operations", "Sales"]);

        let mut other = context.clone();
        other.identity = tenant_identity(7);
        assert!(DepartmentStore::new(&other).fetch_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_departments_by_division() {
        let context = memory_context(tenant_identity(42)).await;
        let divisions = DivisionStore::new(&context);
        let departments = DepartmentStore::new(&context);

        let product = divisions
            .create(&json!({"name": "Product"}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        departments
            .create(&json!({"name": "Design", "division_id": product.id}))
            .await
            .unwrap();
        departments.create(&json!({"name": "Finance"})).await.unwrap();

        let inside = departments.fetch_by_division(product.id.unwrap()).await;
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].name, "Design");
    }

    #[tokio::test]
    async fn test_site_update_and_delete() {
        let store = SiteStore::new(&memory_context(tenant_identity(42)).await);
        let site = store
            .create(&json!({"name": "HQ", "latitude": 23.8, "longitude": 90.4}))
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let moved = store
            .update(site.id.unwrap(), &json!({"address": "Main Street 1"}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(moved.address.as_deref(), Some("Main Street 1"));
        assert_eq!(moved.latitude, Some(23.8));

        assert!(store.delete(site.id.unwrap()).await.unwrap().success);
        assert!(store.items().is_empty());
        assert!(store.fetch(site.id.unwrap()).await.is_none());
    }

    #[test]
    fn test_configs() {
        assert_eq!(GradeStore::config().table_name(), "grades");
        assert_eq!(PositionStore::config().entity_name(), "Position");
        assert!(SiteStore::config().is_company_scoped());
    }
}
