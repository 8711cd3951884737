//! Monthly aggregation for the dashboard and reports screens.
//!
//! Every computation here is a pure, order-independent pass over in-memory
//! record lists; identical input always produces identical output.

use std::collections::BTreeMap;

use shared::{
    Budget, BudgetStatus, CategoryTotal, Flow, Goal, GoalProgress, MonthKey, MonthlySummary,
    PersonShare, Transaction, NO_TOP_CATEGORY, SHARED_MEMBER,
};

use crate::db::DbConnection;
use crate::error::AppResult;
use crate::storage::{BudgetRepository, GoalRepository, MemberRepository, TransactionRepository};

/// Total income, total expenses, and net balance for a transaction list.
pub fn month_totals(transactions: &[Transaction]) -> (f64, f64, f64) {
    let mut income = 0.0;
    let mut expenses = 0.0;
    for tx in transactions {
        match tx.flow {
            Flow::Income => income += tx.amount,
            Flow::Expense => expenses += tx.amount,
        }
    }
    (income, expenses, income - expenses)
}

/// Net balance over income as a percentage. Zero income yields exactly zero
/// instead of a non-finite value.
pub fn savings_rate(total_income: f64, net_balance: f64) -> f64 {
    if total_income <= 0.0 {
        0.0
    } else {
        net_balance / total_income * 100.0
    }
}

/// Expense totals grouped by category, largest first. Ties are broken by
/// category name so the result is stable under input reordering.
pub fn category_totals(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions {
        if tx.flow == Flow::Expense {
            *totals.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
        }
    }

    let mut result: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    result.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

/// The category with the highest expense total, or the "none" sentinel when
/// the list has no expense transactions.
pub fn top_expense_category(transactions: &[Transaction]) -> String {
    category_totals(transactions)
        .into_iter()
        .next()
        .map(|c| c.category)
        .unwrap_or_else(|| NO_TOP_CATEGORY.to_string())
}

/// Expense share per member. Amounts tagged to one member accrue fully to
/// that member; amounts tagged "both" accrue half to each of the two tracked
/// members.
pub fn person_split(
    transactions: &[Transaction],
    first_member: &str,
    second_member: &str,
) -> Vec<PersonShare> {
    let mut shares: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions {
        if tx.flow != Flow::Expense {
            continue;
        }
        if tx.member == SHARED_MEMBER {
            *shares.entry(first_member.to_string()).or_insert(0.0) += tx.amount / 2.0;
            *shares.entry(second_member.to_string()).or_insert(0.0) += tx.amount / 2.0;
        } else {
            *shares.entry(tx.member.clone()).or_insert(0.0) += tx.amount;
        }
    }

    shares
        .into_iter()
        .map(|(member, amount)| PersonShare { member, amount })
        .collect()
}

/// Budget consumption for one budget given the month's spend in its
/// category. The raw percentage is left unclamped; the display percentage
/// is capped at 100 for bounded progress bars.
pub fn budget_status(budget: &Budget, spent: f64) -> BudgetStatus {
    let percent_used = if budget.limit_amount > 0.0 {
        spent / budget.limit_amount * 100.0
    } else {
        0.0
    };

    BudgetStatus {
        budget_id: budget.id.clone(),
        category: budget.category.clone(),
        limit_amount: budget.limit_amount,
        spent,
        remaining: budget.limit_amount - spent,
        percent_used,
        percent_display: percent_used.min(100.0),
        exceeded: spent > budget.limit_amount,
    }
}

/// Goal completion rounded to the nearest whole percent. A zero target is
/// reported as zero progress.
pub fn goal_progress(goal: &Goal) -> GoalProgress {
    let percent = if goal.target_amount > 0.0 {
        (goal.current_amount / goal.target_amount * 100.0).round().max(0.0) as u32
    } else {
        0
    };

    GoalProgress {
        goal_id: goal.id.clone(),
        name: goal.name.clone(),
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        percent,
    }
}

/// Assembles the monthly summary from the stored records.
#[derive(Clone)]
pub struct ReportService {
    transactions: TransactionRepository,
    goals: GoalRepository,
    budgets: BudgetRepository,
    members: MemberRepository,
}

impl ReportService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            transactions: TransactionRepository::new(db.clone()),
            goals: GoalRepository::new(db.clone()),
            budgets: BudgetRepository::new(db.clone()),
            members: MemberRepository::new(db),
        }
    }

    pub async fn monthly_summary(
        &self,
        household_id: &str,
        month: MonthKey,
    ) -> AppResult<MonthlySummary> {
        let start = format!("{}-01", month.prefix());
        let end = format!("{}-31", month.prefix());
        let transactions = self
            .transactions
            .list(household_id, Some(start.as_str()), Some(end.as_str()))
            .await?;

        let (total_income, total_expenses, net_balance) = month_totals(&transactions);
        let categories = category_totals(&transactions);

        // The two tracked members for the "both" split are the household's
        // two oldest profiles. A single-member household keeps the full
        // amount on that member.
        let members = self.members.list_by_household(household_id).await?;
        let first = members.first().map(|m| m.display_name.as_str()).unwrap_or("");
        let second = members.get(1).map(|m| m.display_name.as_str()).unwrap_or(first);
        let split = person_split(&transactions, first, second);

        let budgets = self.budgets.list(household_id).await?;
        let budget_statuses = budgets
            .iter()
            .map(|budget| {
                let spent = categories
                    .iter()
                    .find(|c| c.category == budget.category)
                    .map(|c| c.total)
                    .unwrap_or(0.0);
                budget_status(budget, spent)
            })
            .collect();

        let goals = self.goals.list(household_id).await?;
        let goal_progresses = goals.iter().map(goal_progress).collect();

        Ok(MonthlySummary {
            month,
            total_income,
            total_expenses,
            net_balance,
            savings_rate: savings_rate(total_income, net_balance),
            top_expense_category: top_expense_category(&transactions),
            category_totals: categories,
            person_split: split,
            budgets: budget_statuses,
            goals: goal_progresses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::SpendKind;

    static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

    fn tx(member: &str, category: &str, flow: Flow, amount: f64, date: &str) -> Transaction {
        let n = NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Transaction {
            id: format!("txn-{}-{}-{:04x}", flow.as_str(), n, n),
            household_id: "h1".to_string(),
            member: member.to_string(),
            category: category.to_string(),
            kind: SpendKind::Variable,
            flow,
            amount,
            date: date.to_string(),
            description: format!("{} {}", category, amount),
        }
    }

    #[test]
    fn test_income_minus_expenses_equals_net() {
        let transactions = vec![
            tx("Alice", "salary", Flow::Income, 3000.0, "2025-08-01"),
            tx("Bob", "salary", Flow::Income, 1200.5, "2025-08-02"),
            tx("Alice", "groceries", Flow::Expense, 420.25, "2025-08-05"),
            tx("both", "rent", Flow::Expense, 900.0, "2025-08-01"),
        ];

        let (income, expenses, net) = month_totals(&transactions);
        assert_eq!(income, 4200.5);
        assert_eq!(expenses, 1320.25);
        assert!((income - expenses - net).abs() < 1e-9);
    }

    #[test]
    fn test_net_invariant_holds_per_month_partition() {
        let transactions = vec![
            tx("Alice", "salary", Flow::Income, 3000.0, "2025-07-28"),
            tx("Alice", "groceries", Flow::Expense, 100.0, "2025-07-30"),
            tx("Alice", "salary", Flow::Income, 3000.0, "2025-08-01"),
            tx("Alice", "groceries", Flow::Expense, 250.0, "2025-08-02"),
        ];

        for month in [
            MonthKey { year: 2025, month: 7 },
            MonthKey { year: 2025, month: 8 },
        ] {
            let slice: Vec<Transaction> = transactions
                .iter()
                .filter(|t| month.contains(&t.date))
                .cloned()
                .collect();
            let (income, expenses, net) = month_totals(&slice);
            assert!((income - expenses - net).abs() < 1e-9);
        }
    }

    #[test]
    fn test_savings_rate_zero_when_no_income() {
        let transactions = vec![tx("Alice", "groceries", Flow::Expense, 500.0, "2025-08-05")];
        let (income, _, net) = month_totals(&transactions);
        assert_eq!(savings_rate(income, net), 0.0);
    }

    #[test]
    fn test_savings_rate_scenario() {
        // income 3000, expense 2000 => net 1000, rate 33.3%
        let transactions = vec![
            tx("Alice", "salary", Flow::Income, 3000.0, "2025-08-01"),
            tx("Alice", "rent", Flow::Expense, 2000.0, "2025-08-02"),
        ];
        let (income, _expenses, net) = month_totals(&transactions);
        assert_eq!(net, 1000.0);
        let rate = savings_rate(income, net);
        assert_eq!((rate * 10.0).round() / 10.0, 33.3);
    }

    #[test]
    fn test_top_expense_category_stable_under_reordering() {
        let mut transactions = vec![
            tx("Alice", "groceries", Flow::Expense, 200.0, "2025-08-01"),
            tx("Alice", "dining", Flow::Expense, 150.0, "2025-08-02"),
            tx("Bob", "groceries", Flow::Expense, 100.0, "2025-08-03"),
            tx("Bob", "salary", Flow::Income, 3000.0, "2025-08-01"),
        ];

        let expected = top_expense_category(&transactions);
        assert_eq!(expected, "groceries");

        transactions.reverse();
        assert_eq!(top_expense_category(&transactions), expected);

        transactions.swap(0, 2);
        assert_eq!(top_expense_category(&transactions), expected);
    }

    #[test]
    fn test_top_expense_category_none_sentinel() {
        let transactions = vec![tx("Alice", "salary", Flow::Income, 3000.0, "2025-08-01")];
        assert_eq!(top_expense_category(&transactions), NO_TOP_CATEGORY);
        assert_eq!(top_expense_category(&[]), NO_TOP_CATEGORY);
    }

    #[test]
    fn test_person_split_shared_amount_halved() {
        let transactions = vec![
            tx("both", "rent", Flow::Expense, 900.0, "2025-08-01"),
            tx("Alice", "groceries", Flow::Expense, 100.0, "2025-08-02"),
        ];

        let shares = person_split(&transactions, "Alice", "Bob");
        assert_eq!(shares.len(), 2);

        let alice = shares.iter().find(|s| s.member == "Alice").unwrap();
        let bob = shares.iter().find(|s| s.member == "Bob").unwrap();
        assert_eq!(alice.amount, 550.0);
        assert_eq!(bob.amount, 450.0);

        // Exactly half of the shared amount went to each tracked member
        assert_eq!(alice.amount - 100.0, bob.amount);
    }

    #[test]
    fn test_person_split_ignores_income() {
        let transactions = vec![
            tx("Alice", "salary", Flow::Income, 3000.0, "2025-08-01"),
            tx("Bob", "transport", Flow::Expense, 60.0, "2025-08-02"),
        ];

        let shares = person_split(&transactions, "Alice", "Bob");
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].member, "Bob");
        assert_eq!(shares[0].amount, 60.0);
    }

    #[test]
    fn test_budget_status_remaining_and_exceeded_flip() {
        let budget = Budget {
            id: "budget-1-aaaa".to_string(),
            household_id: "h1".to_string(),
            category: "groceries".to_string(),
            limit_amount: 400.0,
        };

        let under = budget_status(&budget, 399.99);
        assert!(!under.exceeded);
        assert!((under.remaining - 0.01).abs() < 1e-9);

        let exact = budget_status(&budget, 400.0);
        assert!(!exact.exceeded, "Spending exactly the limit is not exceeded");
        assert_eq!(exact.remaining, 0.0);

        let over = budget_status(&budget, 400.01);
        assert!(over.exceeded);
        assert!((over.remaining + 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_budget_status_percentages_raw_and_clamped() {
        let budget = Budget {
            id: "budget-1-aaaa".to_string(),
            household_id: "h1".to_string(),
            category: "groceries".to_string(),
            limit_amount: 200.0,
        };

        let status = budget_status(&budget, 300.0);
        assert_eq!(status.percent_used, 150.0);
        assert_eq!(status.percent_display, 100.0);

        let half = budget_status(&budget, 100.0);
        assert_eq!(half.percent_used, 50.0);
        assert_eq!(half.percent_display, 50.0);
    }

    #[test]
    fn test_goal_progress_scenario() {
        let goal = Goal {
            id: "goal-1-aaaa".to_string(),
            household_id: "h1".to_string(),
            name: "Vacation".to_string(),
            target_amount: 10000.0,
            current_amount: 4500.0,
            created_at: "2025-08-01T10:00:00Z".to_string(),
        };

        assert_eq!(goal_progress(&goal).percent, 45);
    }

    #[test]
    fn test_goal_progress_zero_target() {
        let goal = Goal {
            id: "goal-1-aaaa".to_string(),
            household_id: "h1".to_string(),
            name: "Empty".to_string(),
            target_amount: 0.0,
            current_amount: 100.0,
            created_at: "2025-08-01T10:00:00Z".to_string(),
        };

        assert_eq!(goal_progress(&goal).percent, 0);
    }

    #[tokio::test]
    async fn test_monthly_summary_end_to_end() {
        let db = DbConnection::init_test().await.expect("Failed to init test DB");
        let service = ReportService::new(db.clone());

        let members = MemberRepository::new(db.clone());
        for (id, user, name, at) in [
            ("member-1-aaaa", "user-1", "Alice", "2025-01-01T10:00:00Z"),
            ("member-2-aaaa", "user-2", "Bob", "2025-01-02T10:00:00Z"),
        ] {
            members
                .store(&shared::Member {
                    id: id.to_string(),
                    user_id: user.to_string(),
                    household_id: "h1".to_string(),
                    display_name: name.to_string(),
                    created_at: at.to_string(),
                })
                .await
                .unwrap();
        }

        let transactions = TransactionRepository::new(db.clone());
        for t in [
            tx("Alice", "salary", Flow::Income, 3000.0, "2025-08-01"),
            tx("both", "rent", Flow::Expense, 1000.0, "2025-08-01"),
            tx("Bob", "groceries", Flow::Expense, 1000.0, "2025-08-05"),
            // Outside the report month, must be ignored
            tx("Alice", "groceries", Flow::Expense, 999.0, "2025-07-20"),
        ] {
            transactions.store(&t).await.unwrap();
        }

        let budgets = BudgetRepository::new(db.clone());
        budgets
            .store(&Budget {
                id: "budget-1-aaaa".to_string(),
                household_id: "h1".to_string(),
                category: "groceries".to_string(),
                limit_amount: 800.0,
            })
            .await
            .unwrap();

        let goals = GoalRepository::new(db);
        goals
            .store(&Goal {
                id: "goal-1-aaaa".to_string(),
                household_id: "h1".to_string(),
                name: "Vacation".to_string(),
                target_amount: 10000.0,
                current_amount: 4500.0,
                created_at: "2025-08-01T10:00:00Z".to_string(),
            })
            .await
            .unwrap();

        let summary = service
            .monthly_summary("h1", MonthKey { year: 2025, month: 8 })
            .await
            .unwrap();

        assert_eq!(summary.total_income, 3000.0);
        assert_eq!(summary.total_expenses, 2000.0);
        assert_eq!(summary.net_balance, 1000.0);
        assert_eq!((summary.savings_rate * 10.0).round() / 10.0, 33.3);
        // Ties between rent and groceries (1000 each) resolve by name
        assert_eq!(summary.top_expense_category, "groceries");

        let alice = summary.person_split.iter().find(|s| s.member == "Alice").unwrap();
        let bob = summary.person_split.iter().find(|s| s.member == "Bob").unwrap();
        assert_eq!(alice.amount, 500.0);
        assert_eq!(bob.amount, 1500.0);

        assert_eq!(summary.budgets.len(), 1);
        let groceries = &summary.budgets[0];
        assert_eq!(groceries.spent, 1000.0);
        assert!(groceries.exceeded);
        assert_eq!(groceries.percent_used, 125.0);
        assert_eq!(groceries.percent_display, 100.0);

        assert_eq!(summary.goals.len(), 1);
        assert_eq!(summary.goals[0].percent, 45);
    }
}
