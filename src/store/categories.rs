use crate::error::StoreError;
use crate::model::{is_reserved, Categories, UserContext};
use crate::storage::{self, keys, KeyValueStore};
use crate::store::Ledger;
use tracing::debug;

impl<S: KeyValueStore> Ledger<S> {
    /// The user's categories in insertion order. A user with nothing stored gets the defaults.
    pub fn categories(&self, ctx: &UserContext) -> Categories {
        storage::read(&self.store, &keys::categories(ctx.scope()), || {
            self.default_categories.clone()
        })
    }

    /// Adds a category and returns the name as stored.
    ///
    /// Fails with [`StoreError::DuplicateCategory`] if the name exists ignoring case.
    pub fn add_category(&mut self, ctx: &UserContext, name: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("category name is required"));
        }
        if is_reserved(name) {
            return Err(StoreError::validation(format!(
                "'{name}' is reserved for income"
            )));
        }
        let mut categories = self.categories(ctx);
        if let Some(existing) = categories.find(name) {
            return Err(StoreError::DuplicateCategory(existing.to_string()));
        }
        categories.push(name);
        self.save_categories(ctx, &categories)?;
        debug!("Added category '{name}' for {}", ctx.scope());
        Ok(name.to_string())
    }

    /// Removes the category named exactly `name`.
    ///
    /// Fails with [`StoreError::CategoryInUse`] while any expense carries exactly this category.
    pub fn remove_category(&mut self, ctx: &UserContext, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        let in_use = self
            .transactions(ctx)
            .iter()
            .any(|t| t.is_expense() && t.category() == name);
        if in_use {
            return Err(StoreError::CategoryInUse(name.to_string()));
        }
        let mut categories = self.categories(ctx);
        if !categories.remove_exact(name) {
            return Err(StoreError::CategoryNotFound(name.to_string()));
        }
        self.save_categories(ctx, &categories)?;
        debug!("Removed category '{name}' for {}", ctx.scope());
        Ok(())
    }

    /// Makes sure an expense category exists, creating it if needed, and returns the stored
    /// spelling.
    pub(crate) fn ensure_category(
        &mut self,
        ctx: &UserContext,
        name: &str,
    ) -> Result<String, StoreError> {
        let mut categories = self.categories(ctx);
        if let Some(existing) = categories.find(name) {
            return Ok(existing.to_string());
        }
        categories.push(name);
        self.save_categories(ctx, &categories)?;
        debug!("Created category '{name}' for {}", ctx.scope());
        Ok(name.trim().to_string())
    }

    pub(crate) fn save_categories(
        &mut self,
        ctx: &UserContext,
        categories: &Categories,
    ) -> Result<(), StoreError> {
        storage::write(&mut self.store, &keys::categories(ctx.scope()), categories)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::model::{Categories, TransactionDraft, TransactionType, UserContext, UserIdentity};
    use crate::storage::MemoryStore;
    use crate::store::Ledger;

    fn setup() -> (Ledger<MemoryStore>, UserContext) {
        let ledger = Ledger::new(MemoryStore::new());
        let ctx = UserContext::new(UserIdentity::new("ann@club.org", "Ann"));
        (ledger, ctx)
    }

    fn expense(category: &str) -> TransactionDraft {
        TransactionDraft::new()
            .date("2024-03-01")
            .title("Something")
            .kind(TransactionType::Expense)
            .category(category)
            .amount("10")
    }

    #[test]
    fn test_new_user_gets_defaults() {
        let (ledger, ctx) = setup();
        assert_eq!(ledger.categories(&ctx), Categories::defaults());
        let ledger = ledger.with_default_categories(Categories::new(["Only"]));
        assert_eq!(ledger.categories(&ctx).names(), &["Only"]);
    }

    #[test]
    fn test_add_appends_and_trims() {
        let (mut ledger, ctx) = setup();
        let added = ledger.add_category(&ctx, "  Uniforms ").unwrap();
        assert_eq!(added, "Uniforms");
        let categories = ledger.categories(&ctx);
        assert_eq!(categories.names().last().map(String::as_str), Some("Uniforms"));
        assert_eq!(categories.len(), 6);
    }

    #[test]
    fn test_add_duplicate_ignoring_case() {
        let (mut ledger, ctx) = setup();
        let err = ledger.add_category(&ctx, "food").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCategory(ref name) if name == "Food"));
        assert_eq!(ledger.categories(&ctx), Categories::defaults());
    }

    #[test]
    fn test_add_rejects_blank_and_income() {
        let (mut ledger, ctx) = setup();
        assert!(matches!(
            ledger.add_category(&ctx, "   "),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            ledger.add_category(&ctx, "income"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_remove_unused() {
        let (mut ledger, ctx) = setup();
        ledger.remove_category(&ctx, "Tools").unwrap();
        assert!(ledger.categories(&ctx).find("Tools").is_none());
    }

    #[test]
    fn test_remove_in_use_is_refused() {
        let (mut ledger, ctx) = setup();
        ledger.add_transaction(&ctx, expense("Events")).unwrap();
        let before = ledger.categories(&ctx);
        let err = ledger.remove_category(&ctx, "Events").unwrap_err();
        assert!(matches!(err, StoreError::CategoryInUse(_)));
        assert_eq!(ledger.categories(&ctx), before);
    }

    #[test]
    fn test_remove_missing() {
        let (mut ledger, ctx) = setup();
        let err = ledger.remove_category(&ctx, "Boats").unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
        // The exact spelling is required.
        let err = ledger.remove_category(&ctx, "food").unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
    }

    #[test]
    fn test_scopes_are_isolated() {
        let (mut ledger, ann) = setup();
        let bob = UserContext::new(UserIdentity::new("bob@club.org", "Bob"));
        ledger.add_category(&ann, "Boats").unwrap();
        assert!(ledger.categories(&ann).find("Boats").is_some());
        assert!(ledger.categories(&bob).find("Boats").is_none());
    }
}
