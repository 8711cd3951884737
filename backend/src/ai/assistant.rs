//! Chat assistant: natural-language requests against the household's
//! records, plus the one-shot insight and suggestion generators.
//!
//! The model's reply is decoded as a tagged union that fails closed: any
//! parse failure, unknown discriminator, or missing payload field produces
//! the fixed fallback message and never touches the store.

use serde::Deserialize;
use tracing::warn;

use shared::{
    ChatRequest, ChatResponse, CreateTransactionRequest, DeleteTransactionsRequest, Flow,
    InsightResponse, MonthKey, SpendKind, SuggestionResponse, Transaction,
    UpdateTransactionRequest, SHARED_MEMBER,
};

use crate::ai::GenerativeClient;
use crate::db::DbConnection;
use crate::domain::{BudgetService, GoalService, ReportService, TransactionService};
use crate::error::AppResult;

/// Shown whenever the model's output cannot be decoded into a known action.
pub const FALLBACK_REPLY: &str =
    "Sorry, I could not understand that request. Could you rephrase it?";

/// Shown when the generative API call itself fails.
const UNAVAILABLE_REPLY: &str =
    "The assistant is having trouble reaching its language service right now. Please try again.";

/// How many recent transactions are embedded in the prompt and searched by
/// the fuzzy description match.
const CONTEXT_TRANSACTIONS: u32 = 50;

/// The fixed response contract sent to the model and decoded from it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AssistantAction {
    RecordTransaction {
        description: String,
        amount: f64,
        category: String,
        flow: Flow,
        #[serde(default)]
        member: Option<String>,
        #[serde(default)]
        kind: Option<SpendKind>,
        #[serde(default)]
        date: Option<String>,
    },
    Answer {
        text: String,
    },
    UpdateTransaction {
        description_contains: String,
        #[serde(default)]
        amount: Option<f64>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    DeleteTransaction {
        description_contains: String,
    },
}

/// Decode and validate the model output. Returns None for anything that
/// must not reach the store.
pub fn decode_action(raw: &str) -> Option<AssistantAction> {
    let action: AssistantAction = serde_json::from_str(raw).ok()?;

    match &action {
        AssistantAction::RecordTransaction {
            description,
            amount,
            category,
            ..
        } => {
            if description.trim().is_empty()
                || category.trim().is_empty()
                || !amount.is_finite()
                || *amount <= 0.0
            {
                return None;
            }
        }
        AssistantAction::Answer { text } => {
            if text.trim().is_empty() {
                return None;
            }
        }
        AssistantAction::UpdateTransaction {
            description_contains,
            amount,
            category,
            description,
        } => {
            if description_contains.trim().is_empty() {
                return None;
            }
            if amount.is_none() && category.is_none() && description.is_none() {
                return None;
            }
            if let Some(amount) = amount {
                if !amount.is_finite() || *amount <= 0.0 {
                    return None;
                }
            }
        }
        AssistantAction::DeleteTransaction {
            description_contains,
        } => {
            if description_contains.trim().is_empty() {
                return None;
            }
        }
    }

    Some(action)
}

/// Case-insensitive substring match over the recent transactions. Among
/// several matches the most recent by date wins, with the id as the final
/// tie-break, so the choice is deterministic.
pub fn find_match<'a>(transactions: &'a [Transaction], needle: &str) -> Option<&'a Transaction> {
    let needle = needle.to_lowercase();
    transactions
        .iter()
        .filter(|tx| tx.description.to_lowercase().contains(&needle))
        .max_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)))
}

#[derive(Clone)]
pub struct AssistantService {
    client: GenerativeClient,
    transactions: TransactionService,
    goals: GoalService,
    budgets: BudgetService,
    reports: ReportService,
}

impl AssistantService {
    pub fn new(client: GenerativeClient, db: DbConnection) -> Self {
        Self {
            client,
            transactions: TransactionService::new(db.clone()),
            goals: GoalService::new(db.clone()),
            budgets: BudgetService::new(db.clone()),
            reports: ReportService::new(db),
        }
    }

    /// One conversational turn: embed the records, call the model, and
    /// either answer or perform exactly one store write.
    pub async fn chat(&self, household_id: &str, request: ChatRequest) -> AppResult<ChatResponse> {
        let prompt = self.build_chat_prompt(household_id, &request.message).await?;

        let raw = match self.client.generate_json(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Assistant call failed: {}", e);
                return Ok(ChatResponse {
                    reply: UNAVAILABLE_REPLY.to_string(),
                    action_taken: None,
                });
            }
        };

        self.respond_to_raw(household_id, &raw).await
    }

    /// Decode the model output and dispatch it. Split from `chat` so the
    /// decode-and-dispatch path is testable without the network.
    async fn respond_to_raw(&self, household_id: &str, raw: &str) -> AppResult<ChatResponse> {
        let action = match decode_action(raw) {
            Some(action) => action,
            None => {
                warn!("Assistant returned an undecodable action: {}", raw);
                return Ok(ChatResponse {
                    reply: FALLBACK_REPLY.to_string(),
                    action_taken: None,
                });
            }
        };

        match action {
            AssistantAction::Answer { text } => Ok(ChatResponse {
                reply: text,
                action_taken: None,
            }),

            AssistantAction::RecordTransaction {
                description,
                amount,
                category,
                flow,
                member,
                kind,
                date,
            } => {
                let create = CreateTransactionRequest {
                    member: member.unwrap_or_else(|| SHARED_MEMBER.to_string()),
                    category,
                    kind: kind.unwrap_or(SpendKind::Variable),
                    flow,
                    amount,
                    date,
                    description,
                };
                match self.transactions.create(household_id, create).await {
                    Ok(tx) => Ok(ChatResponse {
                        reply: format!(
                            "Recorded {} of {:.2} for {} ({}).",
                            match tx.flow {
                                Flow::Income => "income",
                                Flow::Expense => "an expense",
                            },
                            tx.amount,
                            tx.category,
                            tx.description
                        ),
                        action_taken: Some("record_transaction".to_string()),
                    }),
                    Err(e) => {
                        warn!("Assistant-driven insert failed: {}", e);
                        Ok(ChatResponse {
                            reply: "I understood the request but recording it failed.".to_string(),
                            action_taken: None,
                        })
                    }
                }
            }

            AssistantAction::UpdateTransaction {
                description_contains,
                amount,
                category,
                description,
            } => {
                let recent = self
                    .transactions
                    .recent(household_id, CONTEXT_TRANSACTIONS)
                    .await?;
                let target = match find_match(&recent, &description_contains) {
                    Some(tx) => tx.clone(),
                    None => {
                        return Ok(ChatResponse {
                            reply: format!(
                                "I could not find a recent transaction matching \"{}\".",
                                description_contains
                            ),
                            action_taken: None,
                        })
                    }
                };

                let update = UpdateTransactionRequest {
                    amount,
                    category,
                    description,
                    ..Default::default()
                };
                match self.transactions.update(household_id, &target.id, update).await {
                    Ok(updated) => Ok(ChatResponse {
                        reply: format!("Updated \"{}\".", updated.description),
                        action_taken: Some("update_transaction".to_string()),
                    }),
                    Err(e) => {
                        warn!("Assistant-driven update failed: {}", e);
                        Ok(ChatResponse {
                            reply: "I found the transaction but updating it failed.".to_string(),
                            action_taken: None,
                        })
                    }
                }
            }

            AssistantAction::DeleteTransaction {
                description_contains,
            } => {
                let recent = self
                    .transactions
                    .recent(household_id, CONTEXT_TRANSACTIONS)
                    .await?;
                let target = match find_match(&recent, &description_contains) {
                    Some(tx) => tx.clone(),
                    None => {
                        return Ok(ChatResponse {
                            reply: format!(
                                "I could not find a recent transaction matching \"{}\".",
                                description_contains
                            ),
                            action_taken: None,
                        })
                    }
                };

                let delete = DeleteTransactionsRequest {
                    transaction_ids: vec![target.id.clone()],
                };
                match self.transactions.delete(household_id, delete).await {
                    Ok(_) => Ok(ChatResponse {
                        reply: format!("Deleted \"{}\".", target.description),
                        action_taken: Some("delete_transaction".to_string()),
                    }),
                    Err(e) => {
                        warn!("Assistant-driven delete failed: {}", e);
                        Ok(ChatResponse {
                            reply: "I found the transaction but deleting it failed.".to_string(),
                            action_taken: None,
                        })
                    }
                }
            }
        }
    }

    /// Short narrative on the current month's spending against budgets.
    pub async fn insight(&self, household_id: &str) -> AppResult<InsightResponse> {
        let summary = self
            .reports
            .monthly_summary(household_id, MonthKey::default())
            .await?;
        let summary_json = serde_json::to_string(&summary)
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;

        let prompt = format!(
            "You are a household finance coach. Given this month's summary as JSON, \
             write two or three plain sentences about how spending compares to the \
             budgets. No markdown, no lists.\n\nSummary:\n{}",
            summary_json
        );

        let insight = self.client.generate_text(&prompt).await?;
        Ok(InsightResponse { insight })
    }

    /// One concrete saving action derived from recent records.
    pub async fn suggestion(&self, household_id: &str) -> AppResult<SuggestionResponse> {
        let recent = self
            .transactions
            .recent(household_id, CONTEXT_TRANSACTIONS)
            .await?;
        let budgets = self.budgets.list(household_id).await?;
        let context = serde_json::to_string(&(recent, budgets))
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;

        let prompt = format!(
            "You are a household finance coach. Given recent transactions and \
             budgets as JSON, suggest exactly one concrete way to save money next \
             month, in one or two plain sentences. No markdown.\n\nRecords:\n{}",
            context
        );

        let suggestion = self.client.generate_text(&prompt).await?;
        Ok(SuggestionResponse { suggestion })
    }

    async fn build_chat_prompt(&self, household_id: &str, message: &str) -> AppResult<String> {
        let recent = self
            .transactions
            .recent(household_id, CONTEXT_TRANSACTIONS)
            .await?;
        let goals = self.goals.list(household_id).await?;
        let budgets = self.budgets.list(household_id).await?;

        let transactions_json = serde_json::to_string(&recent)
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
        let goals_json = serde_json::to_string(&goals)
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
        let budgets_json = serde_json::to_string(&budgets)
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;

        Ok(format!(
            "You are the assistant of a household finance tracker. Reply with a \
             single JSON object and nothing else. The object must have an \
             \"action\" field that is one of \"record_transaction\", \"answer\", \
             \"update_transaction\" or \"delete_transaction\".\n\
             For record_transaction include: description, amount (positive \
             number), category, flow (\"income\" or \"expense\"); optionally \
             member, kind (\"fixed\" or \"variable\") and date (YYYY-MM-DD).\n\
             For answer include: text.\n\
             For update_transaction include: description_contains plus any of \
             amount, category, description.\n\
             For delete_transaction include: description_contains.\n\n\
             Recent transactions (newest first):\n{}\n\n\
             Goals:\n{}\n\n\
             Budgets:\n{}\n\n\
             User message: {}",
            transactions_json, goals_json, budgets_json, message
        ))
    }
}
