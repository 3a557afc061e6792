//! Operator console: grid selection, question presentation and the judge challenge.
//!
//! Every command and timer callback runs under the console lock. Timer
//! callbacks carry the session id of the presentation that started them and
//! do nothing once that presentation is gone.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::{
    dao::repository::DocumentKey,
    dto::{
        console::{AnswerResponse, ConsoleSnapshot, SubAnswerResponse},
        sse::TimesUpScope,
    },
    error::ServiceError,
    services::{judge_service, question_service, sse_events},
    state::{
        SharedState,
        challenge::{JudgeChallenge, SubAnswer},
        console::Console,
        countdown::{CountdownListener, TimerDisplay},
        grid::resolve_cell,
        presentation::QuestionSession,
        question::{CellToken, Question, UsedChallengeQuestions},
        state_machine::{ChallengeStage, ConsoleEvent, ConsolePhase, QuestionStage},
        transitions::run_transition,
    },
};

fn whole_seconds(duration: Duration) -> u32 {
    u32::try_from(duration.as_secs()).unwrap_or(u32::MAX)
}

fn require_idle(console: &Console) -> Result<(), ServiceError> {
    match console.phase() {
        ConsolePhase::Idle => Ok(()),
        other => Err(ServiceError::InvalidState(format!(
            "a presentation is already open ({other:?})"
        ))),
    }
}

fn stop_cue(state: &SharedState, console: &mut Console) {
    if console.cue_playing() {
        console.set_cue_playing(false);
        sse_events::broadcast_timer_cue(state, false);
    }
}

/// Current console state.
pub async fn snapshot(state: &SharedState) -> ConsoleSnapshot {
    let console = state.console().lock().await;
    ConsoleSnapshot::from(&*console)
}

/// Consume grid cell `index` of `part` and put its question on screen.
///
/// Nothing is mutated when the cell is used, out of range or beyond the bank.
pub async fn select_question(
    state: &SharedState,
    part: u8,
    index: u16,
) -> Result<ConsoleSnapshot, ServiceError> {
    let part = question_service::parse_part(part)?;
    let token =
        CellToken::new(part, index).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let mut console = state.console().lock().await;
    require_idle(&console)?;

    let repo = state.documents().await;
    let bank = question_service::load_bank(&repo).await;
    let mut used = question_service::load_used_cells(&repo).await;
    let entity = resolve_cell(&bank, &used, token, state.config().cells(part))?.clone();
    used.insert(token);

    let (repo_ref, used_ref) = (&repo, &used);
    run_transition(
        console.machine_mut(),
        ConsoleEvent::QuestionSelected,
        state.transition_timeout(),
        move || async move {
            repo_ref
                .save(DocumentKey::UsedQuestions, used_ref)
                .await
                .map_err(ServiceError::from)
        },
    )
    .await?;

    let countdown = whole_seconds(state.config().question_countdown);
    let session = console.open_question(
        QuestionSession::new(token, Question::from(entity)),
        countdown,
        TimerDisplay::Clock,
    );
    console.timer_mut().start(
        countdown,
        state.config().warning_threshold_secs,
        Arc::new(ConsoleTimerListener::new(
            state.clone(),
            session,
            TimesUpScope::Question,
        )),
    );

    info!(%token, session, "question selected");
    sse_events::broadcast_grid_updated(state, Some(part.number()), Some(token.to_string()));
    sse_events::broadcast_phase_changed(state, &console);
    Ok(ConsoleSnapshot::from(&*console))
}

/// Lock the options of the open question and mark the operator's pick.
pub async fn submit_answer(
    state: &SharedState,
    letter: &str,
) -> Result<AnswerResponse, ServiceError> {
    let mut console = state.console().lock().await;
    if console.phase() != ConsolePhase::Question(QuestionStage::Shown) {
        return Err(ServiceError::InvalidState(format!(
            "cannot answer while in {:?}",
            console.phase()
        )));
    }

    let outcome = console
        .question_mut()
        .ok_or_else(|| ServiceError::InvalidState("no question is open".into()))?
        .submit_answer(letter)?;
    console.machine_mut().fire(ConsoleEvent::AnswerSubmitted {
        correct: outcome.is_correct,
    })?;
    console.timer_mut().cancel();
    stop_cue(state, &mut console);

    info!(
        selected = %outcome.selected,
        correct = %outcome.correct_answer,
        is_correct = outcome.is_correct,
        "answer submitted"
    );
    sse_events::broadcast_phase_changed(state, &console);
    Ok(AnswerResponse {
        selected: outcome.selected,
        correct_answer: outcome.correct_answer,
        is_correct: outcome.is_correct,
    })
}

/// Show the answer of the open question now, stopping the countdown and any overlay.
pub async fn reveal_answer(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    let mut console = state.console().lock().await;
    let phase = console.phase();
    if !matches!(
        phase,
        ConsolePhase::Question(
            QuestionStage::Shown | QuestionStage::Answered { .. } | QuestionStage::Expired
        )
    ) {
        return Err(ServiceError::InvalidState(format!(
            "cannot reveal an answer while in {phase:?}"
        )));
    }

    console.timer_mut().cancel();
    console.overlay_mut().cancel();
    stop_cue(state, &mut console);
    reveal_question(state, &mut console)?;
    Ok(ConsoleSnapshot::from(&*console))
}

fn reveal_question(state: &SharedState, console: &mut Console) -> Result<(), ServiceError> {
    let was_expired = console.phase() == ConsolePhase::Question(QuestionStage::Expired);
    console.machine_mut().fire(ConsoleEvent::AnswerRevealed)?;
    if let Some(question) = console.question_mut() {
        question.reveal();
    }
    if was_expired {
        sse_events::broadcast_times_up(state, TimesUpScope::Question, false);
    }
    sse_events::broadcast_phase_changed(state, console);
    Ok(())
}

/// Present every challenge question of `judge_id` under one aggregate countdown.
pub async fn start_challenge(
    state: &SharedState,
    judge_id: &str,
) -> Result<ConsoleSnapshot, ServiceError> {
    let mut console = state.console().lock().await;
    require_idle(&console)?;

    let repo = state.documents().await;
    let judges = judge_service::load_judges(&repo).await;
    let judge = judges
        .iter()
        .find(|judge| judge.id == judge_id)
        .ok_or_else(|| ServiceError::NotFound(format!("judge `{judge_id}` not found")))?;
    if judge_service::load_used_judges(&repo)
        .await
        .contains(&judge.id)
    {
        return Err(ServiceError::AlreadyUsed(format!(
            "judge `{}` has already been challenged",
            judge.name
        )));
    }

    let challenge = JudgeChallenge::start(judge, state.config().default_sub_question_secs)?;
    let budget = challenge.budget_secs();
    console.machine_mut().fire(ConsoleEvent::JudgeSelected)?;
    let session = console.open_challenge(challenge, TimerDisplay::Seconds);
    console.timer_mut().start(
        budget,
        state.config().warning_threshold_secs,
        Arc::new(ConsoleTimerListener::new(
            state.clone(),
            session,
            TimesUpScope::Challenge,
        )),
    );

    info!(judge_id, budget, session, "judge challenge started");
    sse_events::broadcast_phase_changed(state, &console);
    Ok(ConsoleSnapshot::from(&*console))
}

/// Mark the operator's pick on challenge sub-question `index`; repeated picks are ignored.
pub async fn answer_sub_question(
    state: &SharedState,
    index: usize,
    letter: &str,
) -> Result<SubAnswerResponse, ServiceError> {
    let mut console = state.console().lock().await;
    let challenge = console
        .challenge_mut()
        .ok_or_else(|| ServiceError::InvalidState("no challenge is open".into()))?;
    let key = challenge.question_key(index);

    let (is_correct, all_answered) = match challenge.answer(index, letter)? {
        SubAnswer::AlreadyAnswered => {
            debug!(index, "challenge question already answered");
            return Ok(SubAnswerResponse {
                index,
                accepted: false,
                is_correct: None,
                all_answered: challenge.all_answered(),
            });
        }
        SubAnswer::Answered {
            is_correct,
            all_answered,
        } => (is_correct, all_answered),
    };

    let event = if all_answered {
        ConsoleEvent::AllSubQuestionsAnswered
    } else {
        ConsoleEvent::SubQuestionAnswered
    };
    console.machine_mut().fire(event)?;
    if all_answered {
        console.timer_mut().cancel();
        stop_cue(state, &mut console);
    }
    sse_events::broadcast_phase_changed(state, &console);

    let repo = state.documents().await;
    let mut answered = repo
        .load(
            DocumentKey::UsedFinalQuestions,
            UsedChallengeQuestions::default(),
        )
        .await;
    if answered.insert(key) {
        repo.save(DocumentKey::UsedFinalQuestions, &answered)
            .await?;
    }
    if all_answered {
        info!("every challenge question answered");
        record_judge_used(state, &mut console).await?;
    }

    Ok(SubAnswerResponse {
        index,
        accepted: true,
        is_correct: Some(is_correct),
        all_answered,
    })
}

/// Append the challenge judge to the used set, at most once per presentation.
async fn record_judge_used(state: &SharedState, console: &mut Console) -> Result<(), ServiceError> {
    let Some(judge_id) = console.challenge().map(|c| c.judge_id().to_string()) else {
        return Ok(());
    };
    if !console.claim_judge_record() {
        return Ok(());
    }

    let repo = state.documents().await;
    let mut used = judge_service::load_used_judges(&repo).await;
    if used.insert(judge_id.clone()) {
        if let Err(err) = repo.save(DocumentKey::UsedJudges, &used).await {
            console.release_judge_record();
            return Err(err.into());
        }
    }
    info!(judge_id, "judge marked as used");
    Ok(())
}

/// Reveal the unanswered sub-questions of a timed-out challenge and record the judge.
async fn finalize_timed_out(state: &SharedState, console: &mut Console) -> Result<(), ServiceError> {
    console.overlay_mut().cancel();
    console.machine_mut().fire(ConsoleEvent::ChallengeRevealed)?;
    let revealed = console
        .challenge_mut()
        .map(JudgeChallenge::reveal_unanswered)
        .unwrap_or_default();
    debug!(?revealed, "revealed unanswered challenge questions");
    sse_events::broadcast_times_up(state, TimesUpScope::Challenge, false);
    sse_events::broadcast_phase_changed(state, console);
    record_judge_used(state, console).await
}

/// Close the current presentation.
///
/// Rejected while a challenge is still running. Closing during the challenge
/// time's-up overlay finalizes the challenge first.
pub async fn close(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    let mut console = state.console().lock().await;
    let phase = console.phase();
    if !phase.can_close() {
        return Err(ServiceError::InvalidState(
            "the challenge is still running".into(),
        ));
    }

    match phase {
        ConsolePhase::Challenge(ChallengeStage::TimedOut) => {
            finalize_timed_out(state, &mut console).await?;
        }
        ConsolePhase::Challenge(_) => record_judge_used(state, &mut console).await?,
        ConsolePhase::Question(QuestionStage::Expired) => {
            sse_events::broadcast_times_up(state, TimesUpScope::Question, false);
        }
        _ => {}
    }

    let had_challenge = console.challenge().is_some();
    if console.cue_playing() {
        sse_events::broadcast_timer_cue(state, false);
    }
    console.clear();
    console.machine_mut().fire(ConsoleEvent::ModalClosed)?;
    sse_events::broadcast_phase_changed(state, &console);
    let snapshot = ConsoleSnapshot::from(&*console);
    drop(console);

    if had_challenge {
        judge_service::refresh_judge_list(state).await;
    }
    info!(?phase, "presentation closed");
    Ok(snapshot)
}

/// Countdown callbacks bound to one presentation.
struct ConsoleTimerListener {
    state: SharedState,
    session: u64,
    scope: TimesUpScope,
}

impl ConsoleTimerListener {
    fn new(state: SharedState, session: u64, scope: TimesUpScope) -> Self {
        Self {
            state,
            session,
            scope,
        }
    }
}

impl CountdownListener for ConsoleTimerListener {
    fn on_tick(&self, remaining: u32) -> BoxFuture<'static, ()> {
        let state = self.state.clone();
        let session = self.session;
        Box::pin(async move {
            let mut console = state.console().lock().await;
            if console.session() != session {
                return;
            }
            let threshold = state.config().warning_threshold_secs;
            console.record_tick(remaining, remaining > 0 && remaining <= threshold);
            sse_events::broadcast_timer_tick(&state, &console);
        })
    }

    fn on_warn(&self, remaining: u32, cue: bool) -> BoxFuture<'static, ()> {
        let state = self.state.clone();
        let session = self.session;
        Box::pin(async move {
            if !cue {
                return;
            }
            let mut console = state.console().lock().await;
            if console.session() != session {
                return;
            }
            console.set_cue_playing(true);
            debug!(remaining, "warning cue started");
            sse_events::broadcast_timer_cue(&state, true);
        })
    }

    fn on_expire(&self) -> BoxFuture<'static, ()> {
        let state = self.state.clone();
        let session = self.session;
        match self.scope {
            TimesUpScope::Question => Box::pin(question_timed_out(state, session)),
            TimesUpScope::Challenge => Box::pin(challenge_timed_out(state, session)),
        }
    }
}

async fn question_timed_out(state: SharedState, session: u64) {
    let mut console = state.console().lock().await;
    if console.session() != session {
        return;
    }
    console.timer_mut().mark_expired();
    stop_cue(&state, &mut console);
    if let Err(err) = console.machine_mut().fire(ConsoleEvent::QuestionTimerExpired) {
        debug!(error = ?err, "question countdown expired after the question moved on");
        return;
    }
    if let Some(question) = console.question_mut() {
        question.expire();
    }

    info!(session, "question time is up");
    sse_events::broadcast_times_up(&state, TimesUpScope::Question, true);
    sse_events::broadcast_phase_changed(&state, &console);

    let delay = state.config().question_overlay;
    console
        .overlay_mut()
        .schedule(delay, reveal_after_question_overlay(state.clone(), session));
}

async fn reveal_after_question_overlay(state: SharedState, session: u64) {
    let mut console = state.console().lock().await;
    if console.session() != session {
        return;
    }
    console.overlay_mut().release();
    if let Err(err) = reveal_question(&state, &mut console) {
        warn!(error = %err, "failed to reveal the answer after time's up");
    }
}

async fn challenge_timed_out(state: SharedState, session: u64) {
    let mut console = state.console().lock().await;
    if console.session() != session {
        return;
    }
    console.timer_mut().mark_expired();
    stop_cue(&state, &mut console);
    if let Err(err) = console.machine_mut().fire(ConsoleEvent::ChallengeTimerExpired) {
        debug!(error = ?err, "challenge countdown expired after the challenge ended");
        return;
    }
    if let Some(challenge) = console.challenge_mut() {
        challenge.lock_unanswered();
    }

    info!(session, "challenge time is up");
    sse_events::broadcast_times_up(&state, TimesUpScope::Challenge, true);
    sse_events::broadcast_phase_changed(&state, &console);

    let delay = state.config().challenge_overlay;
    console
        .overlay_mut()
        .schedule(delay, reveal_after_challenge_overlay(state.clone(), session));
}

async fn reveal_after_challenge_overlay(state: SharedState, session: u64) {
    let mut console = state.console().lock().await;
    if console.session() != session {
        return;
    }
    console.overlay_mut().release();
    if let Err(err) = finalize_timed_out(&state, &mut console).await {
        warn!(error = %err, "failed to finalize the timed-out challenge");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            document_store::{DocumentStore, MemoryDocumentStore},
            question_source::InlineQuestionSource,
        },
        dto::{console::OptionMarkView, phase::VisibleConsolePhase},
        services::question_service,
        state::{AppState, countdown::TimerState},
    };

    const BANK_CSV: &str = "ques,ans_1,ans_2,ans_3,ans_4,correct_ans\n\
        First part one?,red,green,blue,white,B\n\
        Second part one?,one,two,three,four,a\n\
        First part two?,cat,dog,cow,hen,D\n";

    async fn console_state() -> (SharedState, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new(BANK_CSV, 2)),
        );
        state.set_document_store(Arc::new(store.clone())).await;
        question_service::import_csv(&state, Default::default())
            .await
            .unwrap();
        store
            .save(
                "judges",
                json!([{
                    "id": "j1",
                    "name": "Hoa",
                    "title": "Writer",
                    "type": "main",
                    "extra_questions": [
                        {
                            "question": "Sub one?",
                            "answer_options": {"A": "x", "B": "y", "C": "z"},
                            "correct_answer": "A",
                            "time": 60
                        },
                        {
                            "question": "Sub two?",
                            "answer_options": {"A": "x", "B": "y"},
                            "correct_answer": "b",
                            "time": 90
                        }
                    ]
                }]),
            )
            .await
            .unwrap();
        (state, store)
    }

    fn used_judges(store: &MemoryDocumentStore) -> serde_json::Value {
        store.peek("used_judges").unwrap_or(json!([]))
    }

    #[tokio::test(start_paused = true)]
    async fn cell_can_only_be_selected_once() {
        let (state, store) = console_state().await;

        let snapshot = select_question(&state, 1, 2).await.unwrap();
        let question = snapshot.question.unwrap();
        assert_eq!(question.text, "Second part one?");
        assert_eq!(question.token, "part1_2");
        assert_eq!(snapshot.timer.unwrap().display, "2:30");
        assert_eq!(store.peek("used_questions"), Some(json!(["part1_2"])));

        close(&state).await.unwrap();
        let err = select_question(&state, 1, 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyUsed(_)));
        assert_eq!(store.peek("used_questions"), Some(json!(["part1_2"])));
    }

    #[tokio::test(start_paused = true)]
    async fn cell_beyond_bank_mutates_nothing() {
        let (state, store) = console_state().await;
        let err = select_question(&state, 2, 5).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotEnoughData(_)));
        assert_eq!(store.peek("used_questions"), Some(json!([])));
        assert_eq!(snapshot(&state).await.phase, VisibleConsolePhase::Idle);

        assert!(matches!(
            select_question(&state, 1, 59).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answer_marks_correct_option_and_stops_timer() {
        let (state, _store) = console_state().await;
        select_question(&state, 1, 1).await.unwrap();

        let outcome = submit_answer(&state, " a ").await.unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_answer, "B");

        let mut console = state.console().lock().await;
        assert_eq!(console.timer_mut().state(), TimerState::Cancelled);
        drop(console);

        let snapshot = snapshot(&state).await;
        assert_eq!(snapshot.phase, VisibleConsolePhase::QuestionAnswered);
        let marks = snapshot
            .question
            .unwrap()
            .options
            .into_iter()
            .map(|o| o.mark)
            .collect::<Vec<_>>();
        assert_eq!(
            marks,
            vec![
                OptionMarkView::Incorrect,
                OptionMarkView::Correct,
                OptionMarkView::Disabled,
                OptionMarkView::Disabled,
            ]
        );
        assert!(submit_answer(&state, "B").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_question_reveals_after_overlay() {
        let (state, _store) = console_state().await;
        select_question(&state, 1, 1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(140_500)).await;
        let warning = snapshot(&state).await;
        assert_eq!(warning.timer.as_ref().unwrap().display, "0:10");
        assert!(warning.timer.unwrap().warning);
        assert!(warning.cue_playing);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let expired = snapshot(&state).await;
        assert_eq!(expired.phase, VisibleConsolePhase::QuestionExpired);
        assert!(expired.question.unwrap().times_up);
        assert!(!expired.cue_playing);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let revealed = snapshot(&state).await;
        assert_eq!(revealed.phase, VisibleConsolePhase::QuestionRevealed);
        let question = revealed.question.unwrap();
        assert!(!question.times_up);
        assert!(question.answer_revealed);
        assert_eq!(question.options[1].mark, OptionMarkView::Correct);
        assert_eq!(question.options[0].mark, OptionMarkView::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_cancels_pending_timers() {
        let (state, _store) = console_state().await;
        select_question(&state, 1, 1).await.unwrap();
        close(&state).await.unwrap();

        tokio::time::sleep(Duration::from_secs(200)).await;
        let snapshot = snapshot(&state).await;
        assert_eq!(snapshot.phase, VisibleConsolePhase::Idle);
        assert!(snapshot.timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn active_challenge_cannot_be_closed() {
        let (state, _store) = console_state().await;
        let snapshot = start_challenge(&state, "j1").await.unwrap();
        assert_eq!(snapshot.timer.unwrap().display, "150");
        assert!(!snapshot.can_close);

        assert!(matches!(
            close(&state).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn challenge_timeout_reveals_and_records_judge_once() {
        let (state, store) = console_state().await;
        start_challenge(&state, "j1").await.unwrap();

        tokio::time::sleep(Duration::from_millis(150_500)).await;
        let timed_out = snapshot(&state).await;
        assert_eq!(timed_out.phase, VisibleConsolePhase::ChallengeTimedOut);
        assert!(timed_out.challenge.unwrap().times_up);
        assert_eq!(used_judges(&store), json!([]));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let revealed = snapshot(&state).await;
        assert_eq!(revealed.phase, VisibleConsolePhase::ChallengeRevealed);
        let blocks = revealed.challenge.unwrap().blocks;
        assert!(blocks.iter().all(|b| b.revealed && !b.answered));
        assert_eq!(blocks[0].options[0].mark, OptionMarkView::Correct);
        assert_eq!(blocks[1].options[1].mark, OptionMarkView::Correct);
        assert_eq!(used_judges(&store), json!(["j1"]));

        close(&state).await.unwrap();
        assert_eq!(used_judges(&store), json!(["j1"]));
        assert!(matches!(
            start_challenge(&state, "j1").await,
            Err(ServiceError::AlreadyUsed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_during_overlay_finalizes_immediately() {
        let (state, store) = console_state().await;
        start_challenge(&state, "j1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(150_500)).await;

        close(&state).await.unwrap();
        assert_eq!(used_judges(&store), json!(["j1"]));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(used_judges(&store), json!(["j1"]));
        assert_eq!(snapshot(&state).await.phase, VisibleConsolePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn answering_every_sub_question_wins() {
        let (state, store) = console_state().await;
        start_challenge(&state, "j1").await.unwrap();

        let first = answer_sub_question(&state, 0, "c").await.unwrap();
        assert_eq!(first.is_correct, Some(false));
        assert!(!first.all_answered);

        let repeat = answer_sub_question(&state, 0, "a").await.unwrap();
        assert!(!repeat.accepted);
        assert_eq!(store.peek("used_final_questions"), Some(json!(["j1_0"])));

        let last = answer_sub_question(&state, 1, "B").await.unwrap();
        assert_eq!(last.is_correct, Some(true));
        assert!(last.all_answered);
        assert_eq!(
            store.peek("used_final_questions"),
            Some(json!(["j1_0", "j1_1"]))
        );
        assert_eq!(used_judges(&store), json!(["j1"]));

        let snapshot = snapshot(&state).await;
        assert_eq!(snapshot.phase, VisibleConsolePhase::ChallengeAllAnswered);
        assert!(snapshot.can_close);

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(
            super::snapshot(&state).await.phase,
            VisibleConsolePhase::ChallengeAllAnswered
        );
        close(&state).await.unwrap();
        assert_eq!(used_judges(&store), json!(["j1"]));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_store_keeps_cell_and_console_idle() {
        let (state, store) = console_state().await;
        store.set_offline(true);

        let err = select_question(&state, 1, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        let idle = snapshot(&state).await;
        assert_eq!(idle.phase, VisibleConsolePhase::Idle);
        assert!(idle.question.is_none());
        assert!(idle.timer.is_none());
        assert_eq!(
            state.console().lock().await.timer_mut().state(),
            TimerState::Idle
        );
        assert_eq!(store.peek("used_questions"), Some(json!([])));

        store.set_offline(false);
        let shown = select_question(&state, 1, 1).await.unwrap();
        assert_eq!(shown.question.unwrap().token, "part1_1");
        assert_eq!(store.peek("used_questions"), Some(json!(["part1_1"])));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_final_answer_save_still_records_judge_on_close() {
        let (state, store) = console_state().await;
        start_challenge(&state, "j1").await.unwrap();
        answer_sub_question(&state, 0, "A").await.unwrap();

        store.set_offline(true);
        let err = answer_sub_question(&state, 1, "B").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(
            snapshot(&state).await.phase,
            VisibleConsolePhase::ChallengeAllAnswered
        );
        assert_eq!(store.peek("used_final_questions"), Some(json!(["j1_0"])));
        assert_eq!(used_judges(&store), json!([]));

        assert!(matches!(
            close(&state).await,
            Err(ServiceError::Unavailable(_))
        ));
        assert_eq!(used_judges(&store), json!([]));

        store.set_offline(false);
        close(&state).await.unwrap();
        assert_eq!(used_judges(&store), json!(["j1"]));
        assert_eq!(snapshot(&state).await.phase, VisibleConsolePhase::Idle);

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(used_judges(&store), json!(["j1"]));
        assert!(matches!(
            start_challenge(&state, "j1").await,
            Err(ServiceError::AlreadyUsed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn operator_can_reveal_before_time_is_up() {
        let (state, _store) = console_state().await;
        select_question(&state, 2, 1).await.unwrap();

        let revealed = reveal_answer(&state).await.unwrap();
        assert_eq!(revealed.phase, VisibleConsolePhase::QuestionRevealed);
        assert!(revealed.question.unwrap().answer.is_some());
        assert!(reveal_answer(&state).await.is_err());
    }
}
