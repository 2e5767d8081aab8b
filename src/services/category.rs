//! Category service
//!
//! CRUD for income and expense categories, and seeding of the starter set.
//! Categories have no balance side effects.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::ServiceContext;
use crate::audit::{AuditEntry, EntityType};
use crate::backend::{from_row, from_rows, to_row, Filter, Query, Row, Table};
use crate::cache::Observable;
use crate::error::{LaplataError, LaplataResult};
use crate::models::{
    Category, CategoryId, CategoryKind, TransactionKind, UserId, DEFAULT_CATEGORIES,
};

/// Changes to apply to a category
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

/// Service for category management
pub struct CategoryService {
    ctx: Arc<ServiceContext>,
    categories: Observable<Vec<Category>>,
}

impl CategoryService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            categories: Observable::default(),
        }
    }

    /// Latest category collection, ordered by kind then name
    pub fn categories(&self) -> &Observable<Vec<Category>> {
        &self.categories
    }

    pub(crate) fn fetch(&self, kind: Option<CategoryKind>) -> LaplataResult<Vec<Category>> {
        let owner = self.ctx.owner()?;
        let mut query = Query::new().filter(ServiceContext::owner_filter(owner));
        if let Some(kind) = kind {
            query = query.eq("kind", kind.as_str());
        }
        let query = query.order_by("kind", true).order_by("name", true);
        from_rows(self.ctx.backend().select(Table::Categories, &query)?)
    }

    /// List all categories and republish them
    pub fn list(&self) -> LaplataResult<Vec<Category>> {
        let categories = self.fetch(None)?;
        self.categories.replace(categories.clone());
        Ok(categories)
    }

    /// Categories of one kind, by name
    pub fn list_by_kind(&self, kind: CategoryKind) -> LaplataResult<Vec<Category>> {
        self.fetch(Some(kind))
    }

    /// Get a category by ID
    pub fn get(&self, id: CategoryId) -> LaplataResult<Category> {
        let owner = self.ctx.owner()?;
        let query = Query::new()
            .eq("id", id.to_key())
            .filter(ServiceContext::owner_filter(owner));
        let row = self
            .ctx
            .backend()
            .select(Table::Categories, &query)?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::category_not_found(id.to_string()))?;
        from_row(row)
    }

    /// Find a category by name (case-insensitive) or id, optionally of one kind
    pub fn find(
        &self,
        identifier: &str,
        kind: Option<CategoryKind>,
    ) -> LaplataResult<Option<Category>> {
        let categories = self.fetch(kind)?;
        let wanted = identifier.trim().to_lowercase();
        if let Some(found) = categories.iter().find(|c| c.name.to_lowercase() == wanted) {
            return Ok(Some(found.clone()));
        }
        Ok(categories
            .into_iter()
            .find(|c| c.id.matches(identifier)))
    }

    /// Create a category
    pub fn create(&self, name: &str, kind: CategoryKind) -> LaplataResult<Category> {
        let owner = self.ctx.owner()?;
        let category = Category::new(owner, name.trim(), kind);
        category
            .validate()
            .map_err(|e| LaplataError::Validation(e.to_string()))?;

        let stored = self
            .ctx
            .backend()
            .insert(Table::Categories, vec![to_row(&category)?])?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::backend("insert returned no category"))?;
        let category: Category = from_row(stored)?;
        debug!(category = %category.id, "created category");

        self.ctx.record(
            owner,
            AuditEntry::create(
                EntityType::Category,
                category.id.to_key(),
                Some(category.name.clone()),
                &category,
            ),
        );
        self.refresh();
        Ok(category)
    }

    fn reference_filters(owner: UserId, id: CategoryId) -> [Filter; 2] {
        [
            Filter::eq("category_id", id.to_key()),
            ServiceContext::owner_filter(owner),
        ]
    }

    /// Whether any income or expense is filed under `id`
    fn is_referenced(&self, owner: UserId, id: CategoryId) -> LaplataResult<bool> {
        let filters = Self::reference_filters(owner, id);
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            let query = filters
                .iter()
                .cloned()
                .fold(Query::new(), Query::filter)
                .limit(1);
            if !self.ctx.backend().select(Table::for_kind(kind), &query)?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rename a category or change its kind. The kind of a category that
    /// transactions are filed under is fixed.
    pub fn update(&self, id: CategoryId, update: CategoryUpdate) -> LaplataResult<Category> {
        let owner = self.ctx.owner()?;
        let before = self.get(id)?;

        let mut after = before.clone();
        let mut patch = Row::new();
        if let Some(name) = update.name {
            after.name = name.trim().to_string();
            patch.insert("name".into(), Value::String(after.name.clone()));
        }
        if let Some(kind) = update.kind.filter(|kind| *kind != before.kind) {
            if self.is_referenced(owner, id)? {
                return Err(LaplataError::Validation(format!(
                    "Category '{}' is used by transactions, its kind cannot change",
                    before.name
                )));
            }
            after.kind = kind;
            patch.insert("kind".into(), Value::String(kind.as_str().into()));
        }
        after
            .validate()
            .map_err(|e| LaplataError::Validation(e.to_string()))?;
        if patch.is_empty() {
            return Ok(before);
        }

        let filters = ServiceContext::row_filters(owner, id.to_key());
        let row = self
            .ctx
            .backend()
            .update(Table::Categories, &filters, patch)?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::category_not_found(id.to_string()))?;
        let category: Category = from_row(row)?;

        self.ctx.record(
            owner,
            AuditEntry::update(
                EntityType::Category,
                category.id.to_key(),
                Some(category.name.clone()),
                &before,
                &category,
            ),
        );
        self.refresh();
        Ok(category)
    }

    /// Delete a category; its transactions become uncategorized
    pub fn delete(&self, id: CategoryId) -> LaplataResult<Category> {
        let owner = self.ctx.owner()?;
        let category = self.get(id)?;

        let filters = ServiceContext::row_filters(owner, id.to_key());
        if self
            .ctx
            .backend()
            .delete(Table::Categories, &filters)?
            .is_empty()
        {
            return Err(LaplataError::category_not_found(id.to_string()));
        }
        self.detach_transactions(owner, id);

        self.ctx.record(
            owner,
            AuditEntry::delete(
                EntityType::Category,
                category.id.to_key(),
                Some(category.name.clone()),
                &category,
            ),
        );
        self.refresh();
        Ok(category)
    }

    /// Clear `category_id` on transactions filed under a deleted category.
    /// Rows left behind still read as uncategorized since the join misses.
    fn detach_transactions(&self, owner: UserId, id: CategoryId) {
        let filters = Self::reference_filters(owner, id);
        let mut patch = Row::new();
        patch.insert("category_id".into(), Value::Null);
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            match self
                .ctx
                .backend()
                .update(Table::for_kind(kind), &filters, patch.clone())
            {
                Ok(rows) if !rows.is_empty() => {
                    debug!(category = %id, count = rows.len(), "detached transactions")
                }
                Ok(_) => {}
                Err(e) => warn!(
                    category = %id,
                    kind = kind.entity_name(),
                    error = %e,
                    "failed to detach transactions from deleted category"
                ),
            }
        }
    }

    /// Seed the starter categories the owner does not already have
    pub fn create_defaults(&self) -> LaplataResult<Vec<Category>> {
        let owner = self.ctx.owner()?;
        let existing = self.fetch(None)?;

        let missing: Vec<Category> = DEFAULT_CATEGORIES
            .iter()
            .filter(|(name, kind)| {
                !existing
                    .iter()
                    .any(|c| c.kind == *kind && c.name.eq_ignore_ascii_case(name))
            })
            .map(|(name, kind)| Category::new(owner, *name, *kind))
            .collect();
        if missing.is_empty() {
            return Ok(Vec::new());
        }

        let rows = missing.iter().map(to_row).collect::<LaplataResult<Vec<_>>>()?;
        let created: Vec<Category> =
            from_rows(self.ctx.backend().insert(Table::Categories, rows)?)?;
        info!(count = created.len(), "seeded default categories");

        for category in &created {
            self.ctx.record(
                owner,
                AuditEntry::create(
                    EntityType::Category,
                    category.id.to_key(),
                    Some(category.name.clone()),
                    category,
                ),
            );
        }
        self.refresh();
        Ok(created)
    }

    fn refresh(&self) {
        if let Err(e) = self.list() {
            warn!(error = %e, "failed to refresh categories");
        }
    }
}
