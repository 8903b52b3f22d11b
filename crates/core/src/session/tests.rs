use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_chat_model::{
    Feedback, Message, MessageId, Reply, ReplyError, ReplyProducer,
    ReplyRequest, Role,
};
use campus_chat_test_replier::{PresetReply, ScriptedReplier};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use super::{
    DEFAULT_GREETING, REPLY_FAILURE_TEXT, SIMULATED_REPLY_DELAY,
    SessionBuilder, SessionStage,
};

/// A producer whose reply never settles. Keeps a session in the
/// awaiting-reply stage for as long as a test needs.
struct BlockedReplier;

#[async_trait]
impl ReplyProducer for BlockedReplier {
    async fn produce(
        &self,
        _request: ReplyRequest,
    ) -> Result<Reply, ReplyError> {
        std::future::pending().await
    }
}

fn scripted<I>(steps: I) -> ScriptedReplier
where
    I: IntoIterator<Item = PresetReply>,
{
    let mut replier = ScriptedReplier::default();
    for step in steps {
        replier.add_step(step);
    }
    replier
}

/// Counts settlements through the `on_idle` hook, so tests can wait for
/// the n-th turn to finish.
fn settle_counter() -> (impl Fn() + Send + Sync, watch::Receiver<u32>) {
    let (tx, rx) = watch::channel(0u32);
    (move || tx.send_modify(|v| *v += 1), rx)
}

async fn wait_settled(rx: &mut watch::Receiver<u32>, n: u32) {
    timeout(Duration::from_millis(500), rx.wait_for(|v| *v >= n))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_submit_appends_trimmed_user_message() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply(
            "DFS explores one branch fully before backtracking.",
        )]))
        .on_idle(on_idle)
        .build();

    session.submit("  What is DFS?  ");
    wait_settled(&mut settled, 1).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[0].role, Role::Assistant);
    assert_eq!(snapshot.messages[0].content, DEFAULT_GREETING);
    assert_eq!(snapshot.messages[1].role, Role::User);
    assert_eq!(snapshot.messages[1].content, "What is DFS?");
    assert_eq!(snapshot.messages[2].role, Role::Assistant);
    assert_eq!(
        snapshot.messages[2].content,
        "DFS explores one branch fully before backtracking."
    );
    assert_eq!(snapshot.stage, SessionStage::Idle);

    // Identifiers reflect insertion order.
    assert!(snapshot.messages.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_blank_submissions_are_rejected() {
    let session = SessionBuilder::new().build();

    session.submit("");
    session.submit("   \t\n");

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.stage, SessionStage::Idle);
}

#[tokio::test]
async fn test_submission_rejected_while_awaiting_reply() {
    let session = SessionBuilder::new()
        .with_reply_producer(BlockedReplier)
        .build();

    session.submit("first");
    session.submit("second");

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[1].content, "first");
    assert_eq!(snapshot.stage, SessionStage::AwaitingReply);
}

#[tokio::test]
async fn test_busy_session_rejects_submissions() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_idle(on_idle)
        .build();

    session.set_busy(true);
    session.submit("hello?");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.stage, SessionStage::Idle);

    session.set_busy(false);
    session.submit("hello?");
    wait_settled(&mut settled, 1).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
}

#[tokio::test]
async fn test_failed_reply_appends_fallback_message() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::failure(
            "assistant service unavailable",
        )]))
        .on_idle(on_idle)
        .build();

    session.submit("anyone there?");
    wait_settled(&mut settled, 1).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    let last = snapshot.messages.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, REPLY_FAILURE_TEXT);
    assert_eq!(snapshot.stage, SessionStage::Idle);
}

#[tokio::test]
async fn test_session_usable_again_after_settlement() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([
            PresetReply::reply("first answer"),
            PresetReply::reply("second answer"),
        ]))
        .on_idle(on_idle)
        .build();

    session.submit("one");
    wait_settled(&mut settled, 1).await;
    session.submit("two");
    wait_settled(&mut settled, 2).await;

    let snapshot = session.snapshot().await;
    // Exactly one reply per accepted submission.
    assert_eq!(snapshot.messages.len(), 5);
    assert_eq!(snapshot.messages[4].content, "second answer");
}

#[tokio::test]
async fn test_rating_overwrites_previous_value() {
    let (on_idle, mut settled) = settle_counter();
    let ratings = Arc::new(Mutex::new(Vec::new()));
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_feedback({
            let ratings = Arc::clone(&ratings);
            move |id, feedback| {
                ratings.lock().unwrap().push((id, feedback));
            }
        })
        .on_idle(on_idle)
        .build();

    session.submit("hi");
    wait_settled(&mut settled, 1).await;
    let reply_id = session.snapshot().await.messages.last().unwrap().id;

    session.rate_message(reply_id, Feedback::Helpful);
    session.rate_message(reply_id, Feedback::NotHelpful);

    let snapshot = session.snapshot().await;
    let reply = snapshot.messages.last().unwrap();
    assert_eq!(reply.feedback, Some(Feedback::NotHelpful));
    assert_eq!(
        *ratings.lock().unwrap(),
        vec![
            (reply_id, Feedback::Helpful),
            (reply_id, Feedback::NotHelpful)
        ]
    );
}

#[tokio::test]
async fn test_rating_unknown_message_is_ignored() {
    let notified = Arc::new(AtomicBool::new(false));
    let session = SessionBuilder::new()
        .on_feedback({
            let notified = Arc::clone(&notified);
            move |_, _| {
                notified.store(true, Ordering::Relaxed);
            }
        })
        .build();

    session.rate_message(MessageId::new(999), Feedback::Helpful);

    let snapshot = session.snapshot().await;
    assert!(snapshot.messages.iter().all(|msg| msg.feedback.is_none()));
    assert!(!notified.load(Ordering::Relaxed));
}

#[tokio::test]
async fn test_rating_user_message_is_ignored() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_idle(on_idle)
        .build();

    session.submit("hi");
    wait_settled(&mut settled, 1).await;

    let user_id = session.snapshot().await.messages[1].id;
    session.rate_message(user_id, Feedback::Helpful);

    let snapshot = session.snapshot().await;
    assert!(snapshot.messages[1].feedback.is_none());

    // The greeting is an assistant message, so it can be rated.
    let greeting_id = snapshot.messages[0].id;
    session.rate_message(greeting_id, Feedback::Helpful);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages[0].feedback, Some(Feedback::Helpful));
}

#[tokio::test]
async fn test_reset_reseeds_log() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_idle(on_idle)
        .build();

    session.submit("hi");
    wait_settled(&mut settled, 1).await;
    let old_max_id =
        session.snapshot().await.messages.last().unwrap().id;

    session.apply_quick_prompt("a draft that should not survive");
    session.reset();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].role, Role::Assistant);
    assert_eq!(snapshot.messages[0].content, DEFAULT_GREETING);
    assert_eq!(snapshot.stage, SessionStage::Idle);
    assert!(snapshot.draft.is_empty());

    // The identifier counter never rewinds.
    assert!(snapshot.messages[0].id > old_max_id);
}

#[tokio::test]
async fn test_reset_delegates_to_observer() {
    let delegated = Arc::new(AtomicBool::new(false));
    let session = SessionBuilder::new()
        .with_reply_producer(BlockedReplier)
        .on_reset({
            let delegated = Arc::clone(&delegated);
            move || {
                delegated.store(true, Ordering::Relaxed);
            }
        })
        .build();

    session.submit("hi");
    session.apply_quick_prompt("pending draft");
    session.reset();

    let snapshot = session.snapshot().await;
    assert!(delegated.load(Ordering::Relaxed));
    // The observer owns the log replacement, so ours is untouched.
    assert_eq!(snapshot.messages.len(), 2);
    // Pending state and draft are still cleared locally.
    assert_eq!(snapshot.stage, SessionStage::Idle);
    assert!(snapshot.draft.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_reply_discarded_after_reset() {
    let mut replier = scripted([PresetReply::reply("too late")]);
    replier.set_delay(Duration::from_secs(5));
    let session =
        SessionBuilder::new().with_reply_producer(replier).build();

    session.submit("anyone there?");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.stage, SessionStage::AwaitingReply);

    session.reset();

    // Let the superseded reply settle; it must not reach the log.
    sleep(Duration::from_secs(10)).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].content, DEFAULT_GREETING);
    assert_eq!(snapshot.stage, SessionStage::Idle);
}

#[tokio::test]
async fn test_quick_prompt_fills_draft_without_submitting() {
    let (on_idle, mut settled) = settle_counter();
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_idle(on_idle)
        .build();

    session.apply_quick_prompt("Show my timetable");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.draft, "Show my timetable");
    assert_eq!(snapshot.messages.len(), 1);

    session.submit_draft();
    wait_settled(&mut settled, 1).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[1].content, "Show my timetable");
    assert!(snapshot.draft.is_empty());
}

#[tokio::test]
async fn test_empty_draft_submission_is_rejected() {
    let session = SessionBuilder::new().build();

    session.submit_draft();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.stage, SessionStage::Idle);
}

#[tokio::test]
async fn test_initial_log_continues_identifiers() {
    let (on_idle, mut settled) = settle_counter();
    let initial = vec![
        Message::new(MessageId::new(4), Role::Assistant, "Welcome back"),
        Message::new(MessageId::new(7), Role::User, "Hello"),
    ];
    let session = SessionBuilder::new()
        .with_initial_log(initial)
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_idle(on_idle)
        .build();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 2);

    session.submit("hi");
    wait_settled(&mut settled, 1).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages[2].id, MessageId::new(8));
}

#[tokio::test]
async fn test_empty_initial_log_falls_back_to_greeting() {
    let session = SessionBuilder::new()
        .with_initial_log(vec![])
        .with_greeting("Custom greeting")
        .build();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].content, "Custom greeting");
}

#[tokio::test]
async fn test_message_observer_sees_appends_in_order() {
    let (on_idle, mut settled) = settle_counter();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let session = SessionBuilder::new()
        .with_reply_producer(scripted([PresetReply::reply("ok")]))
        .on_message({
            let observed = Arc::clone(&observed);
            move |msg: &Message| {
                observed
                    .lock()
                    .unwrap()
                    .push((msg.role, msg.content.clone()));
            }
        })
        .on_idle(on_idle)
        .build();

    session.submit("hi");
    wait_settled(&mut settled, 1).await;

    // The seed greeting is not an append, only the two new turns are.
    assert_eq!(
        *observed.lock().unwrap(),
        vec![
            (Role::User, "hi".to_owned()),
            (Role::Assistant, "ok".to_owned())
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_simulated_replier_is_the_default() {
    let session = SessionBuilder::new().build();

    session.submit("ping");
    sleep(SIMULATED_REPLY_DELAY + Duration::from_millis(10)).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    let last = snapshot.messages.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert!(last.content.contains("ping"));
    assert_eq!(snapshot.stage, SessionStage::Idle);
}
