//! In-process SuperHero store
//!
//! Records live in a `BTreeMap` keyed by id, so natural order is ascending id.
//! Writers take the lock exclusively; ids come from a monotonic sequence and
//! are never reused.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::error::RepositoryResult;
use super::filter::SuperHeroQuery;
use super::pagination::{Page, PageRequest};
use super::traits::SuperHeroRepository;
use crate::domain::SuperHero;

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, SuperHero>,
    last_id: i64,
}

/// SuperHero store backed by process memory
///
/// Cloning shares the underlying table.
#[derive(Debug, Clone, Default)]
pub struct InMemorySuperHeroRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemorySuperHeroRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn select<'a>(table: &'a Table, query: &'a SuperHeroQuery) -> impl Iterator<Item = &'a SuperHero> {
        // Rows are unique by primary key, so `distinct` never removes anything.
        table.rows.values().filter(move |row| query.spec.matches(row))
    }
}

impl SuperHeroRepository for InMemorySuperHeroRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<SuperHero>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_all(&self, query: &SuperHeroQuery) -> RepositoryResult<Vec<SuperHero>> {
        let table = self.table.read().await;
        Ok(Self::select(&table, query).cloned().collect())
    }

    async fn find_page(
        &self,
        query: &SuperHeroQuery,
        page: &PageRequest,
    ) -> RepositoryResult<Page<SuperHero>> {
        let table = self.table.read().await;
        let mut rows: Vec<&SuperHero> = Self::select(&table, query).collect();
        let total = rows.len() as u64;
        rows.sort_by(|a, b| page.compare(a, b));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.size).unwrap_or(usize::MAX);
        let content = rows.into_iter().skip(offset).take(limit).cloned().collect();
        Ok(Page::new(content, page, total))
    }

    async fn count(&self, query: &SuperHeroQuery) -> RepositoryResult<u64> {
        let table = self.table.read().await;
        Ok(Self::select(&table, query).count() as u64)
    }

    async fn exists_by_id(&self, id: i64) -> RepositoryResult<bool> {
        let table = self.table.read().await;
        Ok(table.rows.contains_key(&id))
    }

    async fn save(&self, mut entity: SuperHero) -> RepositoryResult<SuperHero> {
        let mut table = self.table.write().await;
        let id = match entity.id {
            Some(id) => {
                table.last_id = table.last_id.max(id);
                id
            }
            None => {
                table.last_id += 1;
                table.last_id
            }
        };
        entity.id = Some(id);
        table.rows.insert(id, entity.clone());
        debug!(id, "Stored superHero");
        Ok(entity)
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<()> {
        let mut table = self.table.write().await;
        table.rows.remove(&id);
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FilterCondition, Sort, Specification, SuperHeroField};

    async fn seeded() -> InMemorySuperHeroRepository {
        let repo = InMemorySuperHeroRepository::new();
        for (name, age) in [("Storm", 30), ("Cyclops", 25), ("Rogue", 22)] {
            repo.save(SuperHero::new().with_name(name).with_age(age))
                .await
                .unwrap();
        }
        repo.save(SuperHero::new().with_superpower("unknown"))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemorySuperHeroRepository::new();
        let first = repo.save(SuperHero::new().with_name("A")).await.unwrap();
        let second = repo.save(SuperHero::new().with_name("B")).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = InMemorySuperHeroRepository::new();
        let first = repo.save(SuperHero::new()).await.unwrap();
        repo.delete_by_id(1).await.unwrap();
        let second = repo.save(SuperHero::new()).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_save_with_id_overwrites_every_column() {
        let repo = seeded().await;
        repo.save(SuperHero::new().with_id(1).with_name("Ororo"))
            .await
            .unwrap();
        let stored = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Ororo"));
        assert_eq!(stored.age, None);
    }

    #[tokio::test]
    async fn test_find_all_filters_in_id_order() {
        let repo = seeded().await;
        let query = SuperHeroQuery::new(
            Specification::all().and(FilterCondition::lt(SuperHeroField::Age, 30)),
        );
        let ids: Vec<_> = repo
            .find_all(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|hero| hero.id)
            .collect();
        assert_eq!(ids, vec![Some(2), Some(3)]);
        assert_eq!(repo.count(&query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_page_sorts_then_slices() {
        let repo = seeded().await;
        let request = PageRequest::new(0, 2).with_sort(Sort::asc(SuperHeroField::Name));
        let page = repo.find_page(&SuperHeroQuery::all(), &request).await.unwrap();
        assert_eq!(page.total, 4);
        let names: Vec<_> = page.content.iter().map(|h| h.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Cyclops"), Some("Rogue")]);

        let request = PageRequest::new(1, 2).with_sort(Sort::asc(SuperHeroField::Name));
        let page = repo.find_page(&SuperHeroQuery::all(), &request).await.unwrap();
        let names: Vec<_> = page.content.iter().map(|h| h.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Storm"), None]);
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let repo = seeded().await;
        let page = repo
            .find_page(&SuperHeroQuery::all(), &PageRequest::new(5, 20))
            .await
            .unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let repo = seeded().await;
        repo.delete_by_id(99).await.unwrap();
        assert!(!repo.exists_by_id(99).await.unwrap());
        assert!(repo.exists_by_id(1).await.unwrap());
    }
}
