mod common;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    use crate::common::{context, memory_store, ScriptedProvider, TICKET_REPLY};
    use ticketdesk::config::DEFAULT_GREETING;
    use ticketdesk::llm::models::{Message, Role};
    use ticketdesk::llm::LlmError;
    use ticketdesk::protocol::{system_policy, Category, Priority};
    use ticketdesk::session::{SessionError, SessionRegistry, SessionState};
    use ticketdesk::store::TicketStatus;

    #[tokio::test]
    async fn test_new_session_is_idle_with_greeting() {
        let ctx = context(Arc::new(ScriptedProvider::replying(&[])), memory_store());
        let session = ctx.new_session();

        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.transcript(), &[Message::assistant(DEFAULT_GREETING)]);
        assert!(!session.ticket_created());
    }

    #[tokio::test]
    async fn test_reply_without_marker_appends_verbatim() {
        let provider = Arc::new(ScriptedProvider::replying(&["Got it. What's your full name?"]));
        let store = memory_store();
        let ctx = context(provider.clone(), store.clone());
        let mut session = ctx.new_session();

        let outcome = session.submit(&ctx, "My printer won't connect").await.unwrap();

        assert_eq!(outcome.reply, "Got it. What's your full name?");
        assert!(outcome.ticket.is_none());
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(
            session.transcript().last(),
            Some(&Message::assistant("Got it. What's your full name?"))
        );
        assert!(store.list().unwrap().is_empty());

        // Whole transcript, in order, plus the fixed policy.
        let (sent, system) = provider.call(0);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::Assistant);
        assert_eq!(sent[1], Message::user("My printer won't connect"));
        assert_eq!(system, Some(system_policy()));
    }

    #[tokio::test]
    async fn test_marker_creates_exactly_one_backlog_ticket() {
        let provider = Arc::new(ScriptedProvider::replying(&["What's your name?", TICKET_REPLY]));
        let store = memory_store();
        let ctx = context(provider, store.clone());
        let mut session = ctx.new_session();

        session.submit(&ctx, "My printer won't connect").await.unwrap();
        let outcome = session.submit(&ctx, "Jo, jo@x.com, high is fine").await.unwrap();

        let ticket = outcome.ticket.expect("ticket should be created");
        assert_eq!(ticket.user_name, "Jo");
        assert_eq!(ticket.email, "jo@x.com");
        assert_eq!(ticket.category, Category::TechnicalIssue);
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.title, "Printer");
        assert_eq!(ticket.description, "Won't connect");
        assert_eq!(ticket.status, TicketStatus::Backlog);

        assert!(session.ticket_created());
        assert_eq!(outcome.reply, TICKET_REPLY);
        assert_eq!(session.transcript().last(), Some(&Message::assistant(TICKET_REPLY)));
        assert_eq!(store.list().unwrap(), vec![ticket]);
    }

    #[tokio::test]
    async fn test_malformed_marker_keeps_reply_and_creates_nothing() {
        let reply = r#"Done! TICKET_CREATED:{"userName":"Jo","email":"jo@x.com","category":"Bug Report","priority":"low","title":"T","description":"D",}"#;
        let store = memory_store();
        let ctx = context(Arc::new(ScriptedProvider::replying(&[reply])), store.clone());
        let mut session = ctx.new_session();

        let outcome = session.submit(&ctx, "file it").await.unwrap();

        assert_eq!(outcome.reply, reply);
        assert!(outcome.ticket.is_none());
        assert!(!session.ticket_created());
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.transcript().last(), Some(&Message::assistant(reply)));
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_marker_does_not_duplicate_ticket() {
        let provider = Arc::new(ScriptedProvider::replying(&[TICKET_REPLY, TICKET_REPLY]));
        let store = memory_store();
        let ctx = context(provider, store.clone());
        let mut session = ctx.new_session();

        let first = session.submit(&ctx, "create it").await.unwrap();
        let second = session.submit(&ctx, "did it work?").await.unwrap();

        assert!(first.ticket.is_some());
        assert!(second.ticket.is_none());
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(session.ticket().map(|t| t.id), first.ticket.map(|t| t.id));
    }

    #[tokio::test]
    async fn test_model_failure_rolls_back_and_blocks_until_cleared() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(LlmError::Network("connection refused".to_string())),
            Ok("Sorry about that. What's your name?".to_string()),
        ]));
        let ctx = context(provider, memory_store());
        let mut session = ctx.new_session();
        let before = session.transcript().to_vec();

        let err = session.submit(&ctx, "My printer won't connect").await.unwrap_err();
        assert!(matches!(&err, SessionError::Model(reason) if reason.contains("connection refused")));
        assert_eq!(session.transcript(), before.as_slice());
        assert!(matches!(
            session.state(),
            SessionState::Failed { unsent, .. } if unsent == "My printer won't connect"
        ));

        let blocked = session.submit(&ctx, "hello?").await.unwrap_err();
        assert!(matches!(blocked, SessionError::NotCleared(_)));
        assert_eq!(session.transcript(), before.as_slice());

        let unsent = session.clear_error();
        assert_eq!(unsent.as_deref(), Some("My printer won't connect"));
        assert_eq!(session.state(), &SessionState::Ready);

        let outcome = session.submit(&ctx, "My printer won't connect").await.unwrap();
        assert_eq!(outcome.reply, "Sorry about that. What's your name?");
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_clear_error_without_failure_is_noop() {
        let ctx = context(Arc::new(ScriptedProvider::replying(&[])), memory_store());
        let mut session = ctx.new_session();

        assert_eq!(session.clear_error(), None);
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_second_begin_while_awaiting_is_rejected() {
        let ctx = context(Arc::new(ScriptedProvider::replying(&[])), memory_store());
        let mut session = ctx.new_session();

        session.begin_turn("first").unwrap();
        assert_eq!(session.state(), &SessionState::AwaitingModel);

        let err = session.begin_turn("second").unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1], Message::user("first"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let ctx = context(Arc::new(ScriptedProvider::replying(&[])), memory_store());
        let mut session = ctx.new_session();

        assert!(matches!(session.begin_turn("   "), Err(SessionError::EmptyMessage)));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_model_error() {
        let provider = Arc::new(ScriptedProvider::slow(&["too late"], Duration::from_secs(5)));
        let mut ctx = context(provider, memory_store());
        ctx.timeout = Duration::from_millis(20);
        let mut session = ctx.new_session();

        let err = session.submit(&ctx, "anyone there?").await.unwrap_err();
        assert!(matches!(err, SessionError::Model(_)));
        assert!(matches!(session.state(), SessionState::Failed { .. }));
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_registry_rejects_concurrent_submission() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated(&["Got it. What's your full name?"], gate.clone()));
        let registry = Arc::new(SessionRegistry::new(context(provider.clone(), memory_store())));
        let id = registry.create().unwrap().id;

        let in_flight = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.submit(id, "My printer won't connect").await })
        };
        while provider.call_count() == 0 {
            tokio::task::yield_now().await;
        }

        let second = registry.submit(id, "hello?").await;
        assert!(matches!(second, Err(SessionError::Busy)));
        assert_eq!(
            registry.snapshot(id).unwrap().state,
            SessionState::AwaitingModel
        );

        gate.notify_one();
        let outcome = in_flight.await.unwrap().unwrap();
        assert_eq!(outcome.reply, "Got it. What's your full name?");
        assert_eq!(provider.call_count(), 1);

        let snapshot = registry.snapshot(id).unwrap();
        assert_eq!(snapshot.state, SessionState::Ready);
        assert_eq!(snapshot.transcript.len(), 3);
    }

    #[tokio::test]
    async fn test_registry_unknown_and_removed_sessions() {
        let registry = SessionRegistry::new(context(Arc::new(ScriptedProvider::replying(&[])), memory_store()));
        let id = registry.create().unwrap().id;

        assert!(registry.remove(id).unwrap());
        assert!(!registry.remove(id).unwrap());
        assert!(matches!(registry.snapshot(id), Err(SessionError::NotFound(_))));
        assert!(matches!(
            registry.submit(id, "hi").await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_abandoned_submission_still_completes_turn() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated(
            &["Got it. What's your full name?", "Thanks, Jo."],
            gate.clone(),
        ));
        let registry = SessionRegistry::new(context(provider.clone(), memory_store()));
        let id = registry.create().unwrap().id;

        // The caller stops waiting while the model is still answering.
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            registry.submit(id, "My printer won't connect"),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(registry.snapshot(id).unwrap().state, SessionState::AwaitingModel);

        gate.notify_one();
        while registry.snapshot(id).unwrap().state == SessionState::AwaitingModel {
            tokio::task::yield_now().await;
        }

        let snapshot = registry.snapshot(id).unwrap();
        assert_eq!(snapshot.state, SessionState::Ready);
        assert_eq!(snapshot.transcript.len(), 3);
        assert_eq!(
            snapshot.transcript.last(),
            Some(&Message::assistant("Got it. What's your full name?"))
        );

        gate.notify_one();
        let outcome = registry.submit(id, "Jo").await.unwrap();
        assert_eq!(outcome.reply, "Thanks, Jo.");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reply_for_removed_session_is_dropped() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated(&[TICKET_REPLY], gate.clone()));
        let store = memory_store();
        let registry = Arc::new(SessionRegistry::new(context(provider.clone(), store.clone())));
        let id = registry.create().unwrap().id;

        let in_flight = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.submit(id, "Jo, jo@x.com, high").await })
        };
        while provider.call_count() == 0 {
            tokio::task::yield_now().await;
        }

        assert!(registry.remove(id).unwrap());
        gate.notify_one();

        let result = in_flight.await.unwrap();
        assert!(matches!(result, Err(SessionError::NotFound(missing)) if missing == id));
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(registry.snapshot(id), Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_snapshot_wire_names() {
        let registry = SessionRegistry::new(context(Arc::new(ScriptedProvider::replying(&[])), memory_store()));
        let snapshot = registry.create().unwrap();

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["state"], "idle");
        assert_eq!(value["ticketCreated"], false);
        assert!(value.get("ticket_created").is_none());
        assert_eq!(value["transcript"][0]["role"], "assistant");
    }
}
