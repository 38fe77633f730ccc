//! Wall-clock trigger delivery on the tokio runtime.
//!
//! Each registered trigger is a task that sleeps until the next matching
//! minute and sends [`HostSignal::Fired`] back to the session loop. The
//! coordinator is never touched from these tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wakeroom_core::{Clock, HostError, NotificationHost, TriggerRequest};

/// Messages marshalled onto the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    Fired(String),
    Input(String),
    InputClosed,
}

pub struct TokioNotificationHost {
    signals: UnboundedSender<HostSignal>,
    clock: Arc<dyn Clock>,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl TokioNotificationHost {
    pub fn new(signals: UnboundedSender<HostSignal>, clock: Arc<dyn Clock>) -> Self {
        Self {
            signals,
            clock,
            tasks: HashMap::new(),
        }
    }
}

async fn deliver(
    request: TriggerRequest,
    clock: Arc<dyn Clock>,
    signals: UnboundedSender<HostSignal>,
) {
    let mut after = clock.now();
    loop {
        let Some(at) = request.next_fire_after(after) else {
            break;
        };
        let wait = (at - clock.now()).to_std().unwrap_or_default();
        debug!(identifier = %request.identifier, %at, "Trigger sleeping");
        tokio::time::sleep(wait).await;

        if signals
            .send(HostSignal::Fired(request.identifier.clone()))
            .is_err()
        {
            break;
        }
        if !request.repeats {
            break;
        }
        // Never match the minute that just fired again.
        after = clock.now().max(at);
    }
}

impl NotificationHost for TokioNotificationHost {
    fn request_permission(&mut self) -> Result<bool, HostError> {
        // A terminal session can always notify itself.
        Ok(true)
    }

    fn register_trigger(&mut self, request: TriggerRequest) -> Result<(), HostError> {
        let now = self.clock.now();
        let Some(at) = request.next_fire_after(now) else {
            return Err(HostError::TriggerInPast {
                identifier: request.identifier,
                at: format!("{:02}:{:02}", request.hour, request.minute),
            });
        };

        self.cancel_trigger(&request.identifier);
        info!(
            identifier = %request.identifier,
            next_fire = %at.format("%Y-%m-%d %H:%M"),
            repeats = request.repeats,
            "Trigger registered"
        );
        let identifier = request.identifier.clone();
        let task = tokio::spawn(deliver(
            request,
            Arc::clone(&self.clock),
            self.signals.clone(),
        ));
        self.tasks.insert(identifier, task);
        Ok(())
    }

    fn cancel_trigger(&mut self, identifier: &str) {
        if let Some(task) = self.tasks.remove(identifier) {
            task.abort();
            debug!(identifier, "Trigger cancelled");
        }
    }
}

impl Drop for TokioNotificationHost {
    fn drop(&mut self) {
        for (identifier, task) in self.tasks.drain() {
            if !task.is_finished() {
                warn!(identifier, "Dropping pending trigger");
            }
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::time::timeout;
    use wakeroom_core::{AlarmSpec, ManualClock, Recurrence, SystemClock, ALARM_IDENTIFIER};

    fn seven_am() -> ManualClock {
        ManualClock::new(Local.with_ymd_and_hms(2026, 6, 15, 7, 0, 0).unwrap())
    }

    /// Host driven by `clock`, with one trigger registered a minute ahead.
    fn host_with_trigger(
        clock: &ManualClock,
        recurrence: Recurrence,
    ) -> (TokioNotificationHost, UnboundedReceiver<HostSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut host = TokioNotificationHost::new(tx, Arc::new(clock.clone()));
        let spec = AlarmSpec::new(clock.now() + Duration::minutes(1)).with_recurrence(recurrence);
        let request = TriggerRequest::for_spec(ALARM_IDENTIFIER, &spec, clock.now());
        host.register_trigger(request).unwrap();
        (host, rx)
    }

    async fn nothing_within_three_days(rx: &mut UnboundedReceiver<HostSignal>) -> bool {
        timeout(StdDuration::from_secs(3 * 24 * 3600), rx.recv())
            .await
            .is_err()
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_trigger_fires_exactly_once() {
        let clock = seven_am();
        let (_host, mut rx) = host_with_trigger(&clock, Recurrence::Once);

        assert_eq!(
            rx.recv().await,
            Some(HostSignal::Fired(ALARM_IDENTIFIER.to_string()))
        );
        assert!(nothing_within_three_days(&mut rx).await);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_trigger_reschedules_itself() {
        let clock = seven_am();
        let (host, mut rx) = host_with_trigger(&clock, Recurrence::Daily);

        for _ in 0..3 {
            assert_eq!(
                rx.recv().await,
                Some(HostSignal::Fired(ALARM_IDENTIFIER.to_string()))
            );
        }
        assert!(!host.tasks[ALARM_IDENTIFIER].is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_trigger_never_fires() {
        let clock = seven_am();
        let (mut host, mut rx) = host_with_trigger(&clock, Recurrence::Daily);

        host.cancel_trigger(ALARM_IDENTIFIER);
        assert!(nothing_within_three_days(&mut rx).await);
    }

    fn request_at(at: chrono::DateTime<Local>, recurrence: Recurrence) -> TriggerRequest {
        let spec = AlarmSpec::new(at).with_recurrence(recurrence);
        TriggerRequest::for_spec(ALARM_IDENTIFIER, &spec, Local::now())
    }

    #[tokio::test]
    async fn past_one_shot_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let now = Local::now();
        let clock = ManualClock::new(now);
        let mut host = TokioNotificationHost::new(tx, Arc::new(clock.clone()));
        let request = request_at(now + Duration::minutes(2), Recurrence::Once);

        clock.advance(Duration::days(2));
        assert!(matches!(
            host.register_trigger(request),
            Err(HostError::TriggerInPast { .. })
        ));
        assert!(host.tasks.is_empty());
    }

    #[tokio::test]
    async fn reregistering_replaces_the_task() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut host = TokioNotificationHost::new(tx, Arc::new(SystemClock));
        let at = Local::now() + Duration::hours(1);

        host.register_trigger(request_at(at, Recurrence::Once)).unwrap();
        host.register_trigger(request_at(at, Recurrence::Daily)).unwrap();
        assert_eq!(host.tasks.len(), 1);

        host.cancel_trigger(ALARM_IDENTIFIER);
        assert!(host.tasks.is_empty());
        host.cancel_trigger("unknown");
    }

    #[test]
    fn permission_is_always_granted() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut host = TokioNotificationHost::new(tx, Arc::new(SystemClock));
        assert_eq!(host.request_permission(), Ok(true));
    }
}
