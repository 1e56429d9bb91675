//! Per-counterparty aggregation of a flat message snapshot.
//!
//! The partition/count/sort pass is a pure function over its input; the only
//! side effect in the pipeline — the batch profile lookup for counterparties
//! no input message carried a profile for — lives in the service wrapper
//! ([`crate::chat::ChatService::conversations`]).

use std::collections::HashMap;

use uuid::Uuid;

use cortado_types::models::{Conversation, Message, MessageWithSender, UserProfile};

use crate::error::AppError;

/// Output of the pure pass: one thread per distinct counterparty, already
/// sorted, plus the counterparty ids still needing a profile lookup.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub threads: Vec<Thread>,
    pub missing_profiles: Vec<Uuid>,
}

#[derive(Debug)]
pub struct Thread {
    pub counterparty_id: Uuid,
    pub counterparty: Option<UserProfile>,
    pub last_message: Option<Message>,
    pub unread_count: usize,
}

/// Partition `messages` by counterparty, pick each partition's newest message,
/// count unread received messages, and sort by last activity descending.
///
/// Input needs no ordering. A message that does not involve `current_user` at
/// all is malformed and fails the whole aggregation — nothing partial escapes.
/// Timestamp ties keep the message seen earlier in input order.
pub fn aggregate(
    current_user: Uuid,
    messages: &[MessageWithSender],
) -> Result<Aggregation, AppError> {
    // First-seen order keys the map traversal so output is deterministic
    // before the sort, which keeps re-aggregation of the same input identical.
    let mut order: Vec<Uuid> = Vec::new();
    let mut threads: HashMap<Uuid, Thread> = HashMap::new();

    for item in messages {
        let message = &item.message;
        let counterparty_id = message
            .counterparty(current_user)
            .ok_or(AppError::ForeignMessage { id: message.id })?;

        let thread = threads.entry(counterparty_id).or_insert_with(|| {
            order.push(counterparty_id);
            Thread {
                counterparty_id,
                counterparty: None,
                last_message: None,
                unread_count: 0,
            }
        });

        let newer = match &thread.last_message {
            Some(last) => message.created_at > last.created_at,
            None => true,
        };
        if newer {
            thread.last_message = Some(message.clone());
        }

        if message.receiver_id == current_user && !message.read {
            thread.unread_count += 1;
        }

        if thread.counterparty.is_none() {
            if let Some(sender) = &item.sender {
                if sender.id == counterparty_id {
                    thread.counterparty = Some(sender.clone());
                }
            }
        }
    }

    let mut threads: Vec<Thread> = order
        .into_iter()
        .filter_map(|id| threads.remove(&id))
        .collect();

    // Descending by last activity; a thread with no datable message sorts
    // after all dated ones rather than failing.
    threads.sort_by(|a, b| {
        let a_ts = a.last_message.as_ref().map(|m| m.created_at);
        let b_ts = b.last_message.as_ref().map(|m| m.created_at);
        b_ts.cmp(&a_ts)
    });

    let missing_profiles = threads
        .iter()
        .filter(|t| t.counterparty.is_none())
        .map(|t| t.counterparty_id)
        .collect();

    Ok(Aggregation {
        threads,
        missing_profiles,
    })
}

/// Attach batch-looked-up profiles and settle every thread into a
/// [`Conversation`]. Counterparties the lookup could not resolve render as
/// placeholders instead of failing the view.
pub fn finalize(aggregation: Aggregation, fetched: &[UserProfile]) -> Vec<Conversation> {
    let by_id: HashMap<Uuid, &UserProfile> = fetched.iter().map(|p| (p.id, p)).collect();

    aggregation
        .threads
        .into_iter()
        .map(|thread| Conversation {
            counterparty: thread
                .counterparty
                .or_else(|| by_id.get(&thread.counterparty_id).map(|p| (*p).clone()))
                .unwrap_or_else(|| UserProfile::placeholder(thread.counterparty_id)),
            last_message: thread.last_message,
            unread_count: thread.unread_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn msg(sender: Uuid, receiver: Uuid, at: i64, read: bool) -> MessageWithSender {
        MessageWithSender {
            message: Message {
                id: Uuid::new_v4(),
                sender_id: sender,
                receiver_id: receiver,
                content: format!("m@{at}"),
                read,
                created_at: ts(at),
            },
            sender: None,
        }
    }

    fn with_profile(mut item: MessageWithSender, name: &str) -> MessageWithSender {
        let mut profile = UserProfile::placeholder(item.message.sender_id);
        profile.full_name = name.to_string();
        item.sender = Some(profile);
        item
    }

    #[test]
    fn single_thread_last_message_and_unread() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let input = vec![
            with_profile(msg(a, me, 10, false), "Ada"),
            msg(me, a, 5, true),
        ];

        let agg = aggregate(me, &input).unwrap();
        assert_eq!(agg.threads.len(), 1);

        let thread = &agg.threads[0];
        assert_eq!(thread.counterparty_id, a);
        assert_eq!(thread.last_message.as_ref().unwrap().created_at, ts(10));
        assert_eq!(thread.unread_count, 1);
        assert!(agg.missing_profiles.is_empty());
    }

    #[test]
    fn output_sorted_by_recency_descending() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // Both threads only ever sent by me, out of recency order in input.
        let input = vec![msg(me, a, 20, false), msg(me, b, 30, false)];

        let agg = aggregate(me, &input).unwrap();
        let order: Vec<Uuid> = agg.threads.iter().map(|t| t.counterparty_id).collect();
        assert_eq!(order, vec![b, a]);

        // Neither counterparty ever appeared as an annotated sender.
        assert_eq!(agg.missing_profiles, vec![b, a]);
    }

    #[test]
    fn unread_counts_only_unread_received() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let input = vec![
            msg(a, me, 1, false),
            msg(a, me, 2, false),
            msg(a, me, 3, true),
        ];

        let agg = aggregate(me, &input).unwrap();
        assert_eq!(agg.threads[0].unread_count, 2);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let me = Uuid::new_v4();
        let agg = aggregate(me, &[]).unwrap();
        assert!(agg.threads.is_empty());
        assert!(agg.missing_profiles.is_empty());
    }

    #[test]
    fn partitioning_is_complete() {
        let me = Uuid::new_v4();
        let others: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut input = Vec::new();
        for (i, other) in others.iter().enumerate() {
            input.push(msg(*other, me, i as i64, false));
            input.push(msg(me, *other, 100 + i as i64, false));
        }

        let agg = aggregate(me, &input).unwrap();
        assert_eq!(agg.threads.len(), others.len());

        // Last message per partition dominates every other message in it.
        for thread in &agg.threads {
            let last = thread.last_message.as_ref().unwrap().created_at;
            for item in &input {
                if item.message.counterparty(me) == Some(thread.counterparty_id) {
                    assert!(item.message.created_at <= last);
                }
            }
        }
    }

    #[test]
    fn timestamp_tie_keeps_first_seen() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let first = msg(a, me, 7, true);
        let second = msg(a, me, 7, true);
        let first_id = first.message.id;

        let agg = aggregate(me, &[first, second]).unwrap();
        assert_eq!(agg.threads[0].last_message.as_ref().unwrap().id, first_id);
    }

    #[test]
    fn reaggregation_is_idempotent() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let input = vec![
            msg(a, me, 3, false),
            msg(me, b, 9, false),
            with_profile(msg(a, me, 8, false), "Ada"),
            msg(b, me, 1, true),
        ];

        let once = aggregate(me, &input).unwrap();
        let twice = aggregate(me, &input).unwrap();

        let summary = |agg: &Aggregation| -> Vec<(Uuid, Option<Uuid>, usize)> {
            agg.threads
                .iter()
                .map(|t| {
                    (
                        t.counterparty_id,
                        t.last_message.as_ref().map(|m| m.id),
                        t.unread_count,
                    )
                })
                .collect()
        };
        assert_eq!(summary(&once), summary(&twice));
        assert_eq!(once.missing_profiles, twice.missing_profiles);
    }

    #[test]
    fn foreign_message_rejects_whole_aggregation() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let input = vec![
            msg(a, me, 1, false),
            msg(stranger, a, 2, false),
        ];

        let result = aggregate(me, &input);
        assert!(matches!(result, Err(AppError::ForeignMessage { .. })));
    }

    #[test]
    fn finalize_attaches_fetched_profiles_and_placeholders() {
        let me = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let input = vec![msg(me, a, 5, false), msg(me, b, 6, false)];

        let agg = aggregate(me, &input).unwrap();
        assert_eq!(agg.missing_profiles.len(), 2);

        // The lookup only resolved one of the two.
        let mut fetched = UserProfile::placeholder(a);
        fetched.full_name = "Ada".to_string();
        let conversations = finalize(agg, &[fetched]);

        let for_a = conversations.iter().find(|c| c.counterparty.id == a).unwrap();
        assert_eq!(for_a.counterparty.full_name, "Ada");

        let for_b = conversations.iter().find(|c| c.counterparty.id == b).unwrap();
        assert!(for_b.counterparty.full_name.is_empty());
        assert_eq!(for_b.unread_count, 0);
    }
}
