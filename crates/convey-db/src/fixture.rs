use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::info;

use convey_types::models::{ConversationRecord, LedgerCounters, MessageRecord};

use crate::Database;
use crate::queries::{insert_conversation_rows, insert_message_row, upsert_ledger_row};

/// Seed data for a database, read from JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    #[serde(default)]
    pub conversations: Vec<FixtureConversation>,
    #[serde(default)]
    pub ledger: BTreeMap<String, LedgerCounters>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConversation {
    pub conversation: ConversationRecord,
    /// Exactly one entry must be the root (no `previous`).
    pub messages: Vec<MessageRecord>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub conversations: usize,
    pub messages: usize,
    pub aliases: usize,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing fixture")
    }
}

impl Database {
    /// Seed every conversation and ledger row of `fixture` in one
    /// transaction. Any bad record rolls the whole import back.
    pub fn import(&self, fixture: &Fixture) -> Result<ImportSummary> {
        let summary = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut summary = ImportSummary::default();

            for entry in &fixture.conversations {
                let hash = &entry.conversation.hash;
                let mut roots = entry.messages.iter().filter(|m| m.is_root());
                let root = roots
                    .next()
                    .ok_or_else(|| anyhow!("conversation {} has no root message", hash))?;
                if roots.next().is_some() {
                    return Err(anyhow!("conversation {} has more than one root message", hash));
                }

                insert_conversation_rows(&tx, &entry.conversation, root)?;
                summary.conversations += 1;
                summary.messages += 1;

                for message in entry.messages.iter().filter(|m| !m.is_root()) {
                    insert_message_row(&tx, hash.as_bytes(), message)?;
                    summary.messages += 1;
                }
            }

            for (alias, counters) in &fixture.ledger {
                upsert_ledger_row(&tx, alias, counters)?;
                summary.aliases += 1;
            }

            tx.commit().context("committing fixture")?;
            Ok(summary)
        })?;

        info!(
            "Imported {} conversations, {} messages, {} ledger aliases",
            summary.conversations, summary.messages, summary.aliases
        );
        Ok(summary)
    }
}
