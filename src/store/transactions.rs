use crate::error::StoreError;
use crate::model::{AmountPolicy, Transaction, TransactionDraft, TransactionType, UserContext};
use crate::storage::{self, keys, KeyValueStore};
use crate::store::Ledger;
use tracing::debug;
use uuid::Uuid;

impl<S: KeyValueStore> Ledger<S> {
    /// The user's transactions in insertion order.
    pub fn transactions(&self, ctx: &UserContext) -> Vec<Transaction> {
        storage::read(&self.store, &keys::transactions(ctx.scope()), Vec::new)
    }

    pub fn transaction(&self, ctx: &UserContext, id: &str) -> Option<Transaction> {
        self.transactions(ctx).into_iter().find(|t| t.id() == id)
    }

    /// Validates `draft`, assigns a new id and appends the record.
    ///
    /// Any `id` or `email` on the draft is ignored. An expense whose category is not stored yet
    /// creates that category first.
    pub fn add_transaction(
        &mut self,
        ctx: &UserContext,
        draft: TransactionDraft,
    ) -> Result<Transaction, StoreError> {
        let mut fields = draft.resolve(None, AmountPolicy::Positive)?;
        if fields.kind == TransactionType::Expense {
            fields.category = self.ensure_category(ctx, &fields.category)?;
        }
        let transaction =
            Transaction::from_fields(Uuid::new_v4().to_string(), ctx.email().to_string(), fields);

        let mut transactions = self.transactions(ctx);
        transactions.push(transaction.clone());
        self.save_transactions(ctx, &transactions)?;
        debug!(
            "Added {} '{}' ({}) for {}",
            transaction.kind(),
            transaction.title(),
            transaction.id(),
            ctx.scope()
        );
        Ok(transaction)
    }

    /// Applies the fields present in `draft` over the stored record with this `id`.
    ///
    /// The id and owner never change. The income category rule is applied again to the result.
    pub fn update_transaction(
        &mut self,
        ctx: &UserContext,
        id: &str,
        draft: TransactionDraft,
    ) -> Result<Transaction, StoreError> {
        let mut transactions = self.transactions(ctx);
        let index = transactions
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let base = &transactions[index];
        let mut fields = draft.resolve(Some(base), AmountPolicy::Positive)?;
        if fields.kind == TransactionType::Expense {
            fields.category = self.ensure_category(ctx, &fields.category)?;
        }
        let updated = Transaction::from_fields(base.id.clone(), base.owner.clone(), fields);
        transactions[index] = updated.clone();
        self.save_transactions(ctx, &transactions)?;
        debug!("Updated transaction {id} for {}", ctx.scope());
        Ok(updated)
    }

    /// Removes the record with this `id`. Returns whether anything was removed.
    pub fn delete_transaction(&mut self, ctx: &UserContext, id: &str) -> Result<bool, StoreError> {
        let mut transactions = self.transactions(ctx);
        let before = transactions.len();
        transactions.retain(|t| t.id() != id);
        if transactions.len() == before {
            debug!("Transaction {id} does not exist for {}, nothing to delete", ctx.scope());
            return Ok(false);
        }
        self.save_transactions(ctx, &transactions)?;
        debug!("Deleted transaction {id} for {}", ctx.scope());
        Ok(true)
    }

    pub(crate) fn save_transactions(
        &mut self,
        ctx: &UserContext,
        transactions: &[Transaction],
    ) -> Result<(), StoreError> {
        storage::write(&mut self.store, &keys::transactions(ctx.scope()), transactions)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::model::{TransactionDraft, TransactionType, UserContext, UserIdentity};
    use crate::storage::MemoryStore;
    use crate::store::Ledger;
    use crate::view;
    use rust_decimal::Decimal;

    fn setup() -> (Ledger<MemoryStore>, UserContext) {
        let ledger = Ledger::new(MemoryStore::new());
        let ctx = UserContext::new(UserIdentity::new("ann@club.org", "Ann"));
        (ledger, ctx)
    }

    fn venue() -> TransactionDraft {
        TransactionDraft::new()
            .date("2024-03-01")
            .title("Venue")
            .kind(TransactionType::Expense)
            .category("Events")
            .amount(500.0)
    }

    fn income(amount: f64) -> TransactionDraft {
        TransactionDraft::new()
            .date("2024-03-02")
            .title("Dues")
            .kind(TransactionType::Income)
            .amount(amount)
    }

    #[test]
    fn test_add_expense_scenario() {
        let (mut ledger, ctx) = setup();
        let added = ledger.add_transaction(&ctx, venue()).unwrap();
        assert_eq!(added.owner(), "ann@club.org");
        assert!(!added.id().is_empty());

        let all = ledger.transactions(&ctx);
        assert_eq!(all.len(), 1);
        assert!(ledger.categories(&ctx).contains_exact("Events"));

        let totals = view::totals(&all);
        assert_eq!(totals.income, Decimal::ZERO);
        assert_eq!(totals.expense, Decimal::from(500));
        assert_eq!(totals.balance, Decimal::from(-500));
    }

    #[test]
    fn test_two_incomes_scenario() {
        let (mut ledger, ctx) = setup();
        ledger.add_transaction(&ctx, income(1000.0)).unwrap();
        ledger.add_transaction(&ctx, income(500.0)).unwrap();
        let all = ledger.transactions(&ctx);
        assert_eq!(view::totals(&all).income, Decimal::from(1500));
        assert!(view::by_category(&all).is_empty());
    }

    #[test]
    fn test_income_category_is_forced() {
        let (mut ledger, ctx) = setup();
        for category in ["Food", "Boats", "", "income"] {
            let added = ledger
                .add_transaction(&ctx, income(10.0).category(category))
                .unwrap();
            assert_eq!(added.category(), "Income");
        }
        // Nothing was created for income.
        assert!(ledger.categories(&ctx).find("Boats").is_none());
    }

    #[test]
    fn test_add_creates_missing_category() {
        let (mut ledger, ctx) = setup();
        let added = ledger
            .add_transaction(&ctx, venue().category("Trophies"))
            .unwrap();
        assert_eq!(added.category(), "Trophies");
        assert_eq!(
            ledger.categories(&ctx).names().last().map(String::as_str),
            Some("Trophies")
        );
    }

    #[test]
    fn test_add_uses_stored_category_spelling() {
        let (mut ledger, ctx) = setup();
        let added = ledger.add_transaction(&ctx, venue().category("food")).unwrap();
        assert_eq!(added.category(), "Food");
        assert_eq!(ledger.categories(&ctx).len(), 5);
    }

    #[test]
    fn test_add_ignores_caller_id() {
        let (mut ledger, ctx) = setup();
        let mut draft = venue();
        draft.id = Some("mine".to_string());
        let added = ledger.add_transaction(&ctx, draft).unwrap();
        assert_ne!(added.id(), "mine");
    }

    #[test]
    fn test_add_rejects_invalid_without_writing() {
        let (mut ledger, ctx) = setup();
        let drafts = [
            venue().title("  "),
            venue().amount("abc"),
            venue().amount("-5"),
            venue().amount(0.0),
            TransactionDraft::new().title("No date").amount(1.0),
        ];
        for draft in drafts {
            let err = ledger.add_transaction(&ctx, draft).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{err}");
        }
        assert!(ledger.transactions(&ctx).is_empty());
        assert!(ledger.store().is_empty());
    }

    #[test]
    fn test_update_merges_fields() {
        let (mut ledger, ctx) = setup();
        let added = ledger.add_transaction(&ctx, venue()).unwrap();
        let updated = ledger
            .update_transaction(&ctx, added.id(), TransactionDraft::new().amount("650.50"))
            .unwrap();
        assert_eq!(updated.id(), added.id());
        assert_eq!(updated.title(), "Venue");
        assert_eq!(updated.category(), "Events");
        assert_eq!(updated.amount().value(), Decimal::new(65050, 2));
        assert_eq!(ledger.transaction(&ctx, added.id()), Some(updated));
    }

    #[test]
    fn test_update_to_income_forces_category() {
        let (mut ledger, ctx) = setup();
        let added = ledger.add_transaction(&ctx, venue()).unwrap();
        let updated = ledger
            .update_transaction(
                &ctx,
                added.id(),
                TransactionDraft::new().kind(TransactionType::Income),
            )
            .unwrap();
        assert!(updated.is_income());
        assert_eq!(updated.category(), "Income");
        // The category is no longer in use and can go.
        ledger.remove_category(&ctx, "Events").unwrap();
    }

    #[test]
    fn test_update_unknown_id() {
        let (mut ledger, ctx) = setup();
        ledger.add_transaction(&ctx, venue()).unwrap();
        let err = ledger
            .update_transaction(&ctx, "missing", TransactionDraft::new().title("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == "missing"));
    }

    #[test]
    fn test_delete() {
        let (mut ledger, ctx) = setup();
        let added = ledger.add_transaction(&ctx, venue()).unwrap();
        assert!(!ledger.delete_transaction(&ctx, "missing").unwrap());
        assert_eq!(ledger.transactions(&ctx).len(), 1);
        assert!(ledger.delete_transaction(&ctx, added.id()).unwrap());
        assert!(ledger.transactions(&ctx).is_empty());
    }

    #[test]
    fn test_expense_cannot_use_income_category() {
        let (mut ledger, ctx) = setup();
        for category in ["Income", "income", " INCOME "] {
            let err = ledger
                .add_transaction(&ctx, venue().category(category))
                .unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{category}");
        }
        assert!(ledger.transactions(&ctx).is_empty());

        let added = ledger.add_transaction(&ctx, venue()).unwrap();
        let err = ledger
            .update_transaction(&ctx, added.id(), TransactionDraft::new().category("income"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(ledger.transactions(&ctx)[0].category(), "Events");
    }

    #[test]
    fn test_large_amounts_are_rejected_and_sums_stay_in_range() {
        let (mut ledger, ctx) = setup();
        let err = ledger
            .add_transaction(&ctx, income(0.0).amount("70000000000000000000000000000"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        for _ in 0..3 {
            ledger
                .add_transaction(&ctx, income(0.0).amount("999999999999"))
                .unwrap();
        }
        let totals = view::totals(&ledger.transactions(&ctx));
        assert_eq!(totals.income, Decimal::from(2_999_999_999_997_i64));
        assert_eq!(totals.balance, totals.income);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let (mut ledger, ctx) = setup();
        ledger
            .add_transaction(&ctx, venue().date("2024-05-01").title("Later"))
            .unwrap();
        ledger
            .add_transaction(&ctx, venue().date("2024-01-01").title("Earlier"))
            .unwrap();
        let titles: Vec<_> = ledger
            .transactions(&ctx)
            .iter()
            .map(|t| t.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Later", "Earlier"]);
    }
}
