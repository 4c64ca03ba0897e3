use std::collections::BTreeMap;

use tracing::warn;

use convey_core::store::{LedgerSource, MessageStore, Visitor};
use convey_core::{Error, Result};
use convey_types::RecordHash;
use convey_types::models::{ConversationRecord, LedgerCounters, MediaType, MessageRecord};

use crate::Database;
use crate::models::{ConversationRow, LedgerRow, MessageRow};
use crate::queries::{from_sql_int, to_sql_int};

impl MessageStore for Database {
    fn get_conversation(&self, hash: &RecordHash) -> Result<ConversationRecord> {
        self.get_conversation_row(hash.as_bytes())?
            .ok_or_else(|| Error::not_found(format!("conversation {}", hash)))
            .and_then(conversation_from_row)
    }

    fn get_message(
        &self,
        conversation: &RecordHash,
        start: Option<&RecordHash>,
        visit: &mut Visitor<'_>,
    ) -> Result<()> {
        if self.get_conversation_row(conversation.as_bytes())?.is_none() {
            return Err(Error::not_found(format!("conversation {}", conversation)));
        }

        match start {
            Some(hash) => {
                let row = self
                    .get_message_row(conversation.as_bytes(), hash.as_bytes())?
                    .ok_or_else(|| Error::not_found(format!("message {}", hash)))?;
                visit(&message_from_row(row)?)
            }
            None => {
                for row in self.get_message_rows(conversation.as_bytes())? {
                    visit(&message_from_row(row)?)?;
                }
                Ok(())
            }
        }
    }

    fn get_all_conversations(&self, since: u64) -> Result<Vec<ConversationRecord>> {
        let since = to_sql_int(since, "since")?;
        self.get_conversations_since(since)?
            .into_iter()
            .map(conversation_from_row)
            .collect()
    }

    fn get_recent_conversations(&self, limit: usize) -> Result<Vec<ConversationRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.get_recent_conversation_rows(limit)?
            .into_iter()
            .map(conversation_from_row)
            .collect()
    }
}

impl LedgerSource for Database {
    fn ledger_counters(&self) -> Result<BTreeMap<String, LedgerCounters>> {
        self.get_ledger_rows()?
            .into_iter()
            .map(|row| {
                let counters = counters_from_row(&row)?;
                Ok((row.alias, counters))
            })
            .collect()
    }
}

fn conversation_from_row(row: ConversationRow) -> Result<ConversationRecord> {
    let hash = RecordHash::from(row.hash);
    Ok(ConversationRecord {
        timestamp: from_sql_int(row.timestamp, "timestamp").inspect_err(|e| {
            warn!("Corrupt conversation {}: {}", hash, e);
        })?,
        cost: from_sql_int(row.cost, "cost").inspect_err(|e| {
            warn!("Corrupt conversation {}: {}", hash, e);
        })?,
        hash,
        topic: row.topic,
        author: row.author,
    })
}

fn message_from_row(row: MessageRow) -> Result<MessageRecord> {
    let hash = RecordHash::from(row.hash);
    let media_type = row.media_type.parse::<MediaType>().map_err(|e| {
        Error::MalformedContent(format!("message {}: {}", hash, e))
    })?;
    let timestamp = from_sql_int(row.timestamp, "timestamp").inspect_err(|e| {
        warn!("Corrupt message {}: {}", hash, e);
    })?;
    let cost = from_sql_int(row.cost, "cost").inspect_err(|e| {
        warn!("Corrupt message {}: {}", hash, e);
    })?;
    Ok(MessageRecord {
        hash,
        previous: row.previous.filter(|p| !p.is_empty()).map(RecordHash::from),
        author: row.author,
        timestamp,
        cost,
        media_type,
        content: row.content,
    })
}

fn counters_from_row(row: &LedgerRow) -> Result<LedgerCounters> {
    let field = |value: i64, name: &str| {
        from_sql_int(value, name).inspect_err(|e| {
            warn!("Corrupt ledger row for {}: {}", row.alias, e);
        })
    };
    Ok(LedgerCounters {
        minted: field(row.minted, "minted")?,
        burned: field(row.burned, "burned")?,
        bought: field(row.bought, "bought")?,
        sold: field(row.sold, "sold")?,
        earned: field(row.earned, "earned")?,
        spent: field(row.spent, "spent")?,
    })
}
