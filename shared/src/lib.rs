use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Member label used for expenses shared by the whole household.
/// Such amounts accrue half to each of the two tracked members.
pub const SHARED_MEMBER: &str = "both";

/// Sentinel category label reported when a month has no expense transactions.
pub const NO_TOP_CATEGORY: &str = "none";

/// Direction of money movement for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Income,
    Expense,
}

impl Flow {
    /// Storage representation used in the database and in transaction ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Income => "income",
            Flow::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Flow::Income),
            "expense" => Ok(Flow::Expense),
            _ => Err(format!("Invalid flow: {}", s)),
        }
    }
}

/// Whether a transaction is a recurring (fixed) or discretionary (variable) amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendKind {
    Fixed,
    Variable,
}

impl SpendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendKind::Fixed => "fixed",
            SpendKind::Variable => "variable",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(SpendKind::Fixed),
            "variable" => Ok(SpendKind::Variable),
            _ => Err(format!("Invalid spend kind: {}", s)),
        }
    }
}

/// A single income or expense record, scoped to a household.
///
/// Transaction ID format: "txn-<income|expense>-<epoch_millis>-<hex suffix>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Household this transaction belongs to
    pub household_id: String,
    /// Display name of the member the amount is tagged to, or "both"
    pub member: String,
    /// Free-form spending category (e.g. "groceries")
    pub category: String,
    /// Fixed (recurring) or variable (discretionary)
    pub kind: SpendKind,
    /// Income or expense
    pub flow: Flow,
    /// Amount in household currency; always positive, direction comes from `flow`
    pub amount: f64,
    /// Calendar date in ISO format (YYYY-MM-DD)
    pub date: String,
    /// Description of the transaction (max 256 characters)
    pub description: String,
}

impl Transaction {
    /// Generate a transaction id from the flow and a timestamp.
    pub fn generate_id(flow: Flow, epoch_millis: u64) -> String {
        format!("txn-{}-{}-{}", flow.as_str(), epoch_millis, random_suffix(4))
    }

    /// Parse a transaction id into its flow tag and timestamp.
    pub fn parse_id(id: &str) -> Result<(Flow, u64), IdError> {
        let parts: Vec<&str> = id.split('-').collect();
        if parts.len() != 4 || parts[0] != "txn" {
            return Err(IdError::InvalidFormat);
        }
        let flow = Flow::parse(parts[1]).map_err(|_| IdError::InvalidTag)?;
        let epoch_millis = parts[2].parse::<u64>().map_err(|_| IdError::InvalidTimestamp)?;
        Ok((flow, epoch_millis))
    }

    /// Extract the embedded timestamp, used as a stable sort tie-break.
    pub fn extract_timestamp(&self) -> Result<u64, IdError> {
        Self::parse_id(&self.id).map(|(_, ts)| ts)
    }
}

/// A savings goal tracked by the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub household_id: String,
    pub name: String,
    /// Amount the household wants to reach
    pub target_amount: f64,
    /// Amount saved so far
    pub current_amount: f64,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl Goal {
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("goal-{}-{}", epoch_millis, random_suffix(4))
    }
}

/// A monthly spending limit for one category.
///
/// One row per category by convention; uniqueness is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub household_id: String,
    pub category: String,
    pub limit_amount: f64,
}

impl Budget {
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("budget-{}-{}", epoch_millis, random_suffix(4))
    }
}

/// A member profile linking an authenticated user to a household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub user_id: String,
    pub household_id: String,
    pub display_name: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl Member {
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("member-{}-{}", epoch_millis, random_suffix(4))
    }
}

/// Errors from parsing entity ids.
#[derive(Debug, Clone, PartialEq)]
pub enum IdError {
    InvalidFormat,
    InvalidTag,
    InvalidTimestamp,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::InvalidFormat => write!(f, "Invalid id format"),
            IdError::InvalidTag => write!(f, "Invalid id tag"),
            IdError::InvalidTimestamp => write!(f, "Invalid timestamp in id"),
        }
    }
}

impl std::error::Error for IdError {}

/// Hex suffix appended to generated ids so that two records created in the
/// same millisecond stay distinct.
fn random_suffix(len: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();
    format!("{:x}", now % (16_u128.pow(len as u32)))
        .chars()
        .take(len)
        .collect()
}

/// A calendar month used to scope reports and list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1-based month number
    pub month: u32,
}

impl MonthKey {
    /// ISO prefix shared by every date in this month, e.g. "2025-08".
    pub fn prefix(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Whether an ISO date string (YYYY-MM-DD) falls inside this month.
    pub fn contains(&self, date: &str) -> bool {
        date.starts_with(&self.prefix())
    }
}

impl Default for MonthKey {
    fn default() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request to create an account. Joining an existing household is done by
/// passing its id; otherwise a new household is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub household_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for register and login: a bearer token plus the member profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub member: Member,
}

/// Response containing the household's member profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberListResponse {
    pub members: Vec<Member>,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// Member display name the amount is tagged to, or "both"
    pub member: String,
    pub category: String,
    pub kind: SpendKind,
    pub flow: Flow,
    pub amount: f64,
    /// Optional ISO date override (YYYY-MM-DD); defaults to today
    pub date: Option<String>,
    /// Description of the transaction (max 256 characters)
    pub description: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTransactionRequest {
    pub member: Option<String>,
    pub category: Option<String>,
    pub kind: Option<SpendKind>,
    pub flow: Option<Flow>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// Request for the multi-add screen: several transactions in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateTransactionsRequest {
    pub transactions: Vec<CreateTransactionRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateTransactionsResponse {
    pub created: Vec<Transaction>,
    pub success_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionListRequest {
    /// Cursor for pagination: transaction id to start after
    pub after: Option<String>,
    /// Maximum number of transactions to return
    pub limit: Option<u32>,
    /// Inclusive start date filter (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Inclusive end date filter (YYYY-MM-DD)
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    pub pagination: PaginationInfo,
}

/// Response after creating or updating a single transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction: Transaction,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTransactionsRequest {
    pub transaction_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTransactionsResponse {
    pub deleted_count: usize,
    pub success_message: String,
    pub not_found_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    pub target_amount: f64,
    /// Starting amount; defaults to zero
    pub current_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalResponse {
    pub goal: Goal,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalListResponse {
    pub goals: Vec<Goal>,
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBudgetRequest {
    pub category: String,
    pub limit_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBudgetRequest {
    pub category: Option<String>,
    pub limit_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetResponse {
    pub budget: Budget,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetListResponse {
    pub budgets: Vec<Budget>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Spending total for one category within the report month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Share of the month's expenses attributed to one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonShare {
    pub member: String,
    pub amount: f64,
}

/// Budget consumption for the report month.
///
/// `percent_used` is the raw ratio and may exceed 100; `percent_display`
/// is clamped to 100 for bounded progress rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget_id: String,
    pub category: String,
    pub limit_amount: f64,
    pub spent: f64,
    /// limit − spent; negative once the budget is exceeded
    pub remaining: f64,
    pub percent_used: f64,
    pub percent_display: f64,
    pub exceeded: bool,
}

/// Goal completion, rounded to the nearest whole percent for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: String,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub percent: u32,
}

/// Aggregated view of one month, driving the dashboard and reports screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    /// Net balance over income as a percentage; zero when income is zero
    pub savings_rate: f64,
    /// Category with the highest expense total, or "none"
    pub top_expense_category: String,
    pub category_totals: Vec<CategoryTotal>,
    pub person_split: Vec<PersonShare>,
    pub budgets: Vec<BudgetStatus>,
    pub goals: Vec<GoalProgress>,
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply shown in the conversation
    pub reply: String,
    /// Short tag describing the write the assistant performed, if any
    pub action_taken: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResponse {
    pub insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub suggestion: String,
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Display theme persisted per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Invalid theme: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateThemeRequest {
    pub theme: Theme,
}
