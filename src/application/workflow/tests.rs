use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::*;
use crate::adapters::memory::{
    InMemoryCycleRepository, InMemoryRosterDirectory, InMemoryStatusStore, ManualClock,
    RecordingNotifier,
};
use crate::domain::foundation::{
    ChatId, CycleId, DomainError, ParticipantId, ReportStatusId, Timestamp,
};
use crate::domain::notification::{messages, CycleType, QuestionStatus, ReportKey, ReportStatus};
use crate::domain::roster::Participant;
use crate::ports::StatusStore;

const SUPERVISOR: i64 = 999;

struct Harness {
    engine: WorkflowEngine,
    statuses: Arc<InMemoryStatusStore>,
    roster: Arc<InMemoryRosterDirectory>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
}

fn start() -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap())
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
}

fn harness_with(statuses: Arc<dyn StatusStore>, store: Arc<InMemoryStatusStore>) -> Harness {
    let roster = Arc::new(InMemoryRosterDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(ManualClock::new(start()));
    let engine = WorkflowEngine::new(
        Arc::new(InMemoryCycleRepository::new()),
        statuses,
        roster.clone(),
        notifier.clone(),
        clock.clone(),
        WorkflowSettings {
            supervisor_chat_id: Some(ChatId::new(SUPERVISOR).unwrap()),
            ..WorkflowSettings::default()
        },
    );
    Harness {
        engine,
        statuses: store,
        roster,
        notifier,
        clock,
    }
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStatusStore::new());
    harness_with(store.clone(), store)
}

fn participant(h: &Harness, name: &str, chat: i64) -> Participant {
    let p = Participant::new(
        ParticipantId::new(),
        ChatId::new(chat).unwrap(),
        name,
        Some("Ivanova".to_string()),
    )
    .unwrap();
    h.roster.add(p.clone());
    p
}

fn row_for(h: &Harness, p: &Participant, key: ReportKey) -> ReportStatus {
    h.statuses
        .all()
        .into_iter()
        .find(|r| r.participant_id == p.id && r.report_key == key)
        .unwrap()
}

#[tokio::test]
async fn initiate_with_empty_roster_creates_only_the_cycle() {
    let h = harness();
    let outcome = h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    assert_eq!(outcome.participants, 0);
    assert_eq!(outcome.rows_created, 0);
    assert!(h.statuses.is_empty());
    assert_eq!(h.notifier.count(), 0);
}

#[tokio::test]
async fn initiate_sends_first_question_with_buttons_for_its_row() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);

    let outcome = h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();

    assert_eq!(outcome.rows_created, 2);
    assert_eq!(outcome.questions_sent, 1);
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    assert_eq!(first.last_notified_at, Some(start()));
    let sent = h.notifier.sent_to(anna.chat_id);
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].text,
        messages::question("Anna", ReportKey::Table1Lessons)
    );
    let buttons = sent[0].buttons.clone().unwrap();
    assert_eq!(buttons.yes_token, format!("ans_yes_{}", first.id));
    assert_eq!(buttons.no_token, format!("ans_no_{}", first.id));
}

#[tokio::test]
async fn initiate_retrigger_does_not_resend_or_duplicate() {
    let h = harness();
    participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::EndMonth, date()).await.unwrap();

    let again = h.engine.initiate(CycleType::EndMonth, date()).await.unwrap();

    assert_eq!(again.rows_created, 0);
    assert_eq!(again.questions_sent, 0);
    assert_eq!(h.statuses.len(), 3);
    assert_eq!(h.notifier.count(), 1);
}

#[tokio::test]
async fn delivery_failure_is_isolated_and_retried_on_retrigger() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    let boris = participant(&h, "Boris", 2);
    h.notifier.fail_for(anna.chat_id);

    let outcome = h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();

    assert_eq!(outcome.questions_sent, 1);
    assert_eq!(outcome.failures, 1);
    assert_eq!(h.statuses.len(), 4);
    assert!(row_for(&h, &anna, ReportKey::Table1Lessons)
        .last_notified_at
        .is_none());
    assert!(row_for(&h, &boris, ReportKey::Table1Lessons)
        .last_notified_at
        .is_some());

    h.notifier.recover(anna.chat_id);
    let retry = h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    assert_eq!(retry.questions_sent, 1);
    assert_eq!(h.notifier.sent_to(anna.chat_id).len(), 1);
}

#[tokio::test]
async fn yes_on_unknown_row_is_stale() {
    let h = harness();
    let outcome = h.engine.process_yes(ReportStatusId::new()).await.unwrap();
    assert_eq!(outcome, ResponseOutcome::Stale);
    assert_eq!(h.notifier.count(), 0);
}

#[tokio::test]
async fn no_twice_does_not_rearm_the_reminder() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);

    assert_eq!(
        h.engine.process_no(first.id).await.unwrap(),
        ResponseOutcome::ReminderArmed
    );
    let armed = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.clock.advance(Duration::minutes(10));
    assert_eq!(
        h.engine.process_no(first.id).await.unwrap(),
        ResponseOutcome::AlreadyHandled
    );

    let after = row_for(&h, &anna, ReportKey::Table1Lessons);
    assert_eq!(after.remind_at, armed.remind_at);
    assert_eq!(after.response_attempts, 1);
    // question + one acknowledgement
    assert_eq!(h.notifier.sent_to(anna.chat_id).len(), 2);
    assert_eq!(h.notifier.sent()[1].text, messages::NO_ACKNOWLEDGEMENT);
    assert!(h.notifier.sent()[1].buttons.is_none());
}

#[tokio::test]
async fn no_after_yes_is_ignored() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.engine.process_yes(first.id).await.unwrap();

    assert_eq!(
        h.engine.process_no(first.id).await.unwrap(),
        ResponseOutcome::AlreadyHandled
    );
    assert_eq!(
        row_for(&h, &anna, ReportKey::Table1Lessons).status,
        QuestionStatus::AnsweredYes
    );
}

#[tokio::test]
async fn yes_during_escalation_advances_and_clears_reminder() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.engine.process_no(first.id).await.unwrap();

    let outcome = h.engine.process_yes(first.id).await.unwrap();

    assert_eq!(
        outcome,
        ResponseOutcome::Advanced(ReportKey::Table3Schedule)
    );
    let confirmed = row_for(&h, &anna, ReportKey::Table1Lessons);
    assert_eq!(confirmed.status, QuestionStatus::AnsweredYes);
    assert!(confirmed.remind_at.is_none());
    let next = row_for(&h, &anna, ReportKey::Table3Schedule);
    assert_eq!(next.last_notified_at, Some(start()));
}

#[tokio::test]
async fn missing_row_is_created_and_asked_before_completion() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    let lost = row_for(&h, &anna, ReportKey::Table3Schedule);
    h.statuses.remove(&lost.id);

    let outcome = h.engine.process_yes(first.id).await.unwrap();

    assert_eq!(
        outcome,
        ResponseOutcome::Advanced(ReportKey::Table3Schedule)
    );
    let recreated = row_for(&h, &anna, ReportKey::Table3Schedule);
    assert_ne!(recreated.id, lost.id);
    assert_eq!(recreated.status, QuestionStatus::PendingQuestion);
    assert!(h
        .notifier
        .sent_to(ChatId::new(SUPERVISOR).unwrap())
        .is_empty());
}

#[tokio::test]
async fn completion_without_supervisor_still_thanks_participant() {
    let store = Arc::new(InMemoryStatusStore::new());
    let roster = Arc::new(InMemoryRosterDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = WorkflowEngine::new(
        Arc::new(InMemoryCycleRepository::new()),
        store.clone(),
        roster.clone(),
        notifier.clone(),
        Arc::new(ManualClock::new(start())),
        WorkflowSettings::default(),
    );
    let anna =
        Participant::new(ParticipantId::new(), ChatId::new(1).unwrap(), "Anna", None).unwrap();
    roster.add(anna.clone());
    engine.initiate(CycleType::MidMonth, date()).await.unwrap();

    for key in CycleType::MidMonth.expected_report_keys() {
        let row = store
            .all()
            .into_iter()
            .find(|r| r.report_key == *key)
            .unwrap();
        engine.process_yes(row.id).await.unwrap();
    }

    let sent = notifier.sent();
    assert_eq!(sent.last().unwrap().text, messages::THANK_YOU);
    assert!(sent.iter().all(|m| m.chat_id == anna.chat_id));
}

#[tokio::test]
async fn failed_first_reminder_leaves_row_due() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.engine.process_no(first.id).await.unwrap();
    h.clock.advance(Duration::minutes(61));
    h.notifier.fail_for(anna.chat_id);

    let outcome = h.engine.sweep_first_reminder().await.unwrap();

    assert_eq!(outcome.due, 1);
    assert_eq!(outcome.failed, 1);
    let row = row_for(&h, &anna, ReportKey::Table1Lessons);
    assert_eq!(row.status, QuestionStatus::AnsweredNo);
    assert!(row.remind_at.is_some());

    h.notifier.recover(anna.chat_id);
    let retry = h.engine.sweep_first_reminder().await.unwrap();
    assert_eq!(retry.reminded, 1);
}

#[tokio::test]
async fn inactive_participants_are_not_reminded() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.engine.process_no(first.id).await.unwrap();
    h.roster.deactivate(&anna.id);
    h.clock.advance(Duration::hours(2));

    let outcome = h.engine.sweep_first_reminder().await.unwrap();

    assert_eq!(outcome.skipped, 1);
    assert_eq!(
        row_for(&h, &anna, ReportKey::Table1Lessons).status,
        QuestionStatus::AnsweredNo
    );
}

#[tokio::test]
async fn skipped_reminder_leaves_the_due_queue() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.engine.process_no(first.id).await.unwrap();
    h.roster.deactivate(&anna.id);
    h.clock.advance(Duration::hours(2));

    let outcome = h.engine.sweep_first_reminder().await.unwrap();
    assert_eq!(outcome.due, 1);
    assert_eq!(outcome.skipped, 1);

    let row = row_for(&h, &anna, ReportKey::Table1Lessons);
    assert_eq!(row.status, QuestionStatus::AnsweredNo);
    assert!(row.remind_at.is_none());

    h.clock.advance(Duration::hours(2));
    let again = h.engine.sweep_first_reminder().await.unwrap();
    assert_eq!(again.due, 0);
    assert_eq!(again.skipped, 0);
}

#[tokio::test]
async fn undelivered_next_question_is_deferred_and_retried() {
    let h = harness();
    let anna = participant(&h, "Anna", 1);
    h.engine.initiate(CycleType::MidMonth, date()).await.unwrap();
    let first = row_for(&h, &anna, ReportKey::Table1Lessons);
    h.notifier.fail_for(anna.chat_id);

    let outcome = h.engine.process_yes(first.id).await.unwrap();

    assert_eq!(
        outcome,
        ResponseOutcome::Deferred(ReportKey::Table3Schedule)
    );
    let deferred = row_for(&h, &anna, ReportKey::Table3Schedule);
    assert_eq!(deferred.status, QuestionStatus::PendingQuestion);
    assert!(deferred.last_notified_at.is_none());
    assert_eq!(
        deferred.remind_at,
        Some(start().plus(Duration::minutes(60)))
    );

    h.notifier.recover(anna.chat_id);
    let before = h.notifier.sent_to(anna.chat_id).len();
    let early = h.engine.sweep_first_reminder().await.unwrap();
    assert_eq!(early.due, 0);

    h.clock.advance(Duration::minutes(61));
    let retry = h.engine.sweep_first_reminder().await.unwrap();

    assert_eq!(retry.reminded, 1);
    let asked = row_for(&h, &anna, ReportKey::Table3Schedule);
    assert_eq!(asked.status, QuestionStatus::PendingQuestion);
    assert!(asked.remind_at.is_none());
    assert_eq!(
        asked.last_notified_at,
        Some(start().plus(Duration::minutes(61)))
    );
    assert_eq!(h.notifier.sent_to(anna.chat_id).len(), before + 1);

    let settled = h.engine.sweep_first_reminder().await.unwrap();
    assert_eq!(settled.due, 0);
}

/// Status store whose conditional updates always lose, as if a click landed
/// between the sweep's read and write.
struct LosingStore {
    inner: Arc<InMemoryStatusStore>,
}

#[async_trait]
impl StatusStore for LosingStore {
    async fn create(&self, row: &ReportStatus) -> Result<(), DomainError> {
        self.inner.create(row).await
    }

    async fn bulk_create(&self, rows: &[ReportStatus]) -> Result<u64, DomainError> {
        self.inner.bulk_create(rows).await
    }

    async fn get_by_composite_key(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        report_key: ReportKey,
    ) -> Result<Option<ReportStatus>, DomainError> {
        self.inner
            .get_by_composite_key(participant_id, cycle_id, report_key)
            .await
    }

    async fn get_by_id(&self, id: &ReportStatusId) -> Result<Option<ReportStatus>, DomainError> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, row: &ReportStatus) -> Result<(), DomainError> {
        self.inner.update(row).await
    }

    async fn update_if_status(
        &self,
        _row: &ReportStatus,
        _expected: QuestionStatus,
    ) -> Result<bool, DomainError> {
        Ok(false)
    }

    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ReportStatus>, DomainError> {
        self.inner.list_by_cycle(cycle_id).await
    }

    async fn list_by_status(
        &self,
        cycle_id: &CycleId,
        status: QuestionStatus,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        self.inner.list_by_status(cycle_id, status).await
    }

    async fn list_due_first_reminders(
        &self,
        now: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        self.inner.list_due_first_reminders(now).await
    }

    async fn list_stalled_from_previous_day(
        &self,
        statuses: &[QuestionStatus],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ReportStatus>, DomainError> {
        self.inner
            .list_stalled_from_previous_day(statuses, start, end)
            .await
    }

    async fn all_confirmed(
        &self,
        participant_id: &ParticipantId,
        cycle_id: &CycleId,
        keys: &[ReportKey],
    ) -> Result<bool, DomainError> {
        self.inner.all_confirmed(participant_id, cycle_id, keys).await
    }
}

#[tokio::test]
async fn lost_race_on_yes_is_superseded_and_sends_nothing() {
    let store = Arc::new(InMemoryStatusStore::new());
    let h = harness_with(Arc::new(LosingStore { inner: store.clone() }), store);
    let anna = participant(&h, "Anna", 1);
    let row = ReportStatus::pending(anna.id, CycleId::new(), ReportKey::Table1Lessons, start());
    h.statuses.create(&row).await.unwrap();

    let outcome = h.engine.process_yes(row.id).await.unwrap();

    assert_eq!(outcome, ResponseOutcome::Superseded);
    assert_eq!(h.notifier.count(), 0);
    assert_eq!(
        h.statuses.get_by_id(&row.id).await.unwrap().unwrap().status,
        QuestionStatus::PendingQuestion
    );
}
