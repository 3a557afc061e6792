use std::{future::Future, time::Duration};

use tokio::time::timeout;
use tracing::warn;

use crate::{
    error::ServiceError,
    state::state_machine::{ConsoleEvent, ConsolePhase, ConsoleStateMachine, Plan},
};

/// Plan `event`, run `work`, then apply the plan on success or abort it on failure.
///
/// `work` is bounded by `limit` when set; a timeout aborts the plan.
pub async fn run_transition<F, Fut, T>(
    machine: &mut ConsoleStateMachine,
    event: ConsoleEvent,
    limit: Option<Duration>,
    work: F,
) -> Result<(T, ConsolePhase), ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let Plan { id: plan_id, .. } = machine.plan(event)?;

    let work_future = work();
    let outcome = match limit {
        Some(limit) => match timeout(limit, work_future).await {
            Ok(result) => result,
            Err(_) => {
                if let Err(abort_err) = machine.abort(plan_id) {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after timeout"
                    );
                }
                return Err(ServiceError::Timeout);
            }
        },
        None => work_future.await,
    };

    match outcome {
        Ok(value) => {
            let next = machine.apply(plan_id)?;
            Ok((value, next))
        }
        Err(err) => {
            if let Err(abort_err) = machine.abort(plan_id) {
                warn!(
                    event = ?event,
                    plan_id = %plan_id,
                    error = ?abort_err,
                    "failed to abort transition after work error"
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::QuestionStage;

    #[tokio::test]
    async fn successful_work_applies_plan() {
        let mut machine = ConsoleStateMachine::new();
        let (value, next) = run_transition(
            &mut machine,
            ConsoleEvent::QuestionSelected,
            None,
            || async { Ok::<_, ServiceError>(7) },
        )
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(next, ConsolePhase::Question(QuestionStage::Shown));
    }

    #[tokio::test]
    async fn failed_work_aborts_plan() {
        let mut machine = ConsoleStateMachine::new();
        let err = run_transition(
            &mut machine,
            ConsoleEvent::QuestionSelected,
            None,
            || async { Err::<(), _>(ServiceError::Degraded) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
        assert_eq!(machine.phase(), ConsolePhase::Idle);
        assert!(machine.snapshot().pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_times_out() {
        let mut machine = ConsoleStateMachine::new();
        let err = run_transition(
            &mut machine,
            ConsoleEvent::JudgeSelected,
            Some(Duration::from_secs(1)),
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ServiceError>(())
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
        assert_eq!(machine.phase(), ConsolePhase::Idle);
    }
}
