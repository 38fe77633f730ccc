//! Single-alarm scheduler.
//!
//! Holds at most one [`AlarmSpec`] and keeps exactly one host trigger,
//! registered under [`ALARM_IDENTIFIER`], in sync with it.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::host::{NotificationHost, TriggerRequest};
use super::spec::{AlarmSpec, Recurrence};
use crate::clock::Clock;
use crate::error::{CoreError, HostError};
use crate::events::{Event, EventQueue};

/// Fixed identifier of the one alarm trigger.
pub const ALARM_IDENTIFIER: &str = "wakeroom.alarm";

pub struct AlarmScheduler {
    host: Box<dyn NotificationHost>,
    clock: Arc<dyn Clock>,
    events: EventQueue,
    spec: Option<AlarmSpec>,
    trigger: Option<TriggerRequest>,
    armed: bool,
}

impl AlarmScheduler {
    pub fn new(host: Box<dyn NotificationHost>, clock: Arc<dyn Clock>, events: EventQueue) -> Self {
        Self {
            host,
            clock,
            events,
            spec: None,
            trigger: None,
            armed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn spec(&self) -> Option<&AlarmSpec> {
        self.spec.as_ref()
    }

    /// Trigger currently registered with the host.
    pub fn trigger(&self) -> Option<&TriggerRequest> {
        self.trigger.as_ref()
    }

    /// Whether a fired signal for `identifier` belongs to the live alarm.
    pub fn accepts(&self, identifier: &str) -> bool {
        self.armed && identifier == ALARM_IDENTIFIER
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Ask the host for notification permission. Denial is only logged.
    pub fn request_permission(&mut self) -> bool {
        let granted = match self.host.request_permission() {
            Ok(granted) => granted,
            Err(HostError::PermissionDenied) => false,
            Err(e) => {
                warn!(error = %e, "Failed to request notification permission");
                false
            }
        };
        if granted {
            info!("Notification permission granted");
        } else {
            warn!("Notification permission denied; alarms are scheduled anyway");
        }
        self.events.push(Event::PermissionResolved {
            granted,
            at: self.clock.now(),
        });
        granted
    }

    /// Arm `spec`, replacing any previous alarm and its trigger.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range spec (the previous
    /// alarm stays armed), or the host error if registration fails (the
    /// scheduler is then left disarmed).
    pub fn set(&mut self, spec: AlarmSpec) -> Result<(), CoreError> {
        spec.validate()?;

        let now = self.clock.now();
        self.host.cancel_trigger(ALARM_IDENTIFIER);
        self.trigger = None;

        let request = TriggerRequest::for_spec(ALARM_IDENTIFIER, &spec, now);
        let next_fire = request.next_fire_after(now);

        if let Err(e) = self.host.register_trigger(request.clone()) {
            error!(error = %e, "Failed to schedule alarm");
            self.spec = None;
            self.armed = false;
            return Err(e.into());
        }

        info!(
            time = %spec.fire_at.format("%H:%M"),
            max_volume_pct = (spec.max_volume * 100.0).round() as u32,
            fade_in_secs = spec.fade_in_secs,
            recurrence = ?spec.recurrence,
            audio = spec.audio.as_ref().map(|a| a.file_name()).unwrap_or_default(),
            "Alarm set"
        );

        self.events.push(Event::AlarmArmed {
            fire_at: spec.fire_at,
            next_fire,
            recurrence: spec.recurrence,
            at: now,
        });
        self.trigger = Some(request);
        self.spec = Some(spec);
        self.armed = true;
        Ok(())
    }

    /// Disarm and deregister. Safe to call when nothing is armed.
    pub fn cancel(&mut self) {
        self.host.cancel_trigger(ALARM_IDENTIFIER);
        self.trigger = None;
        let was_armed = self.armed || self.spec.is_some();
        self.spec = None;
        self.armed = false;
        if was_armed {
            info!("Alarm disabled");
            self.events.push(Event::AlarmCancelled {
                at: self.clock.now(),
            });
        }
    }

    /// Record that the live alarm fired.
    ///
    /// A one-shot alarm is disarmed and its trigger removed, so a host that
    /// keeps matching hour:minute daily cannot ring it again. A daily alarm
    /// stays armed.
    pub fn mark_fired(&mut self) {
        let Some(spec) = self.spec.as_ref() else {
            return;
        };
        match spec.recurrence {
            Recurrence::Daily => debug!("Daily alarm fired; staying armed"),
            Recurrence::Once => {
                self.host.cancel_trigger(ALARM_IDENTIFIER);
                self.trigger = None;
                self.spec = None;
                self.armed = false;
                debug!("One-shot alarm fired; disarmed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ValidationError;
    use crate::simulation::RecordingHost;
    use chrono::{DateTime, Local, TimeZone};

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, 7, 0, 0).unwrap()
    }

    fn scheduler() -> (AlarmScheduler, RecordingHost, EventQueue) {
        let host = RecordingHost::new();
        let events = EventQueue::new();
        let scheduler = AlarmScheduler::new(
            Box::new(host.clone()),
            Arc::new(ManualClock::new(start())),
            events.clone(),
        );
        (scheduler, host, events)
    }

    #[test]
    fn set_arms_and_registers_one_trigger() {
        let (mut scheduler, host, events) = scheduler();
        let spec = AlarmSpec::new(start() + chrono::Duration::hours(1));
        scheduler.set(spec.clone()).unwrap();

        assert!(scheduler.is_armed());
        assert_eq!(scheduler.spec(), Some(&spec));
        assert_eq!(host.active_triggers(), vec![ALARM_IDENTIFIER.to_string()]);
        let request = host.trigger(ALARM_IDENTIFIER).unwrap();
        assert_eq!((request.hour, request.minute), (8, 0));
        assert!(matches!(events.drain().as_slice(), [Event::AlarmArmed { .. }]));
    }

    #[test]
    fn set_twice_replaces_the_trigger() {
        let (mut scheduler, host, _) = scheduler();
        scheduler.set(AlarmSpec::new(start())).unwrap();
        scheduler
            .set(AlarmSpec::new(start() + chrono::Duration::minutes(30)))
            .unwrap();

        assert_eq!(host.active_triggers().len(), 1);
        assert_eq!(host.trigger(ALARM_IDENTIFIER).unwrap().minute, 30);
        assert_eq!(host.register_calls(), 2);
    }

    #[test]
    fn invalid_spec_keeps_previous_alarm() {
        let (mut scheduler, host, _) = scheduler();
        scheduler.set(AlarmSpec::new(start())).unwrap();
        let err = scheduler
            .set(AlarmSpec::new(start()).with_max_volume(2.0))
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::VolumeOutOfRange(_))
        ));
        assert!(scheduler.is_armed());
        assert_eq!(host.active_triggers().len(), 1);
    }

    #[test]
    fn registration_failure_leaves_scheduler_disarmed() {
        let (mut scheduler, host, _) = scheduler();
        host.fail_next_registration("host offline");

        let err = scheduler.set(AlarmSpec::new(start())).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Host(HostError::RegistrationFailed { .. })
        ));
        assert!(!scheduler.is_armed());
        assert!(scheduler.spec().is_none());
        assert!(host.active_triggers().is_empty());
    }

    #[test]
    fn cancel_clears_state_and_deregisters() {
        let (mut scheduler, host, events) = scheduler();
        scheduler.set(AlarmSpec::new(start())).unwrap();
        events.drain();

        scheduler.cancel();
        assert!(!scheduler.is_armed());
        assert!(scheduler.spec().is_none());
        assert!(host.active_triggers().is_empty());
        assert!(matches!(events.drain().as_slice(), [Event::AlarmCancelled { .. }]));

        scheduler.cancel();
        assert!(events.is_empty());
    }

    #[test]
    fn mark_fired_disarms_once_but_not_daily() {
        let (mut scheduler, host, _) = scheduler();
        scheduler.set(AlarmSpec::new(start())).unwrap();
        scheduler.mark_fired();
        assert!(!scheduler.is_armed());
        assert!(host.active_triggers().is_empty());

        scheduler
            .set(AlarmSpec::new(start()).with_recurrence(Recurrence::Daily))
            .unwrap();
        scheduler.mark_fired();
        assert!(scheduler.is_armed());
        assert_eq!(host.active_triggers().len(), 1);
    }

    #[test]
    fn permission_denial_does_not_block_set() {
        let (mut scheduler, host, events) = scheduler();
        host.set_permission(false);
        assert!(!scheduler.request_permission());
        assert!(matches!(
            events.drain().as_slice(),
            [Event::PermissionResolved { granted: false, .. }]
        ));
        scheduler.set(AlarmSpec::new(start())).unwrap();
        assert!(scheduler.is_armed());
    }

    #[test]
    fn accepts_only_live_identifier() {
        let (mut scheduler, _, _) = scheduler();
        assert!(!scheduler.accepts(ALARM_IDENTIFIER));
        scheduler.set(AlarmSpec::new(start())).unwrap();
        assert!(scheduler.accepts(ALARM_IDENTIFIER));
        assert!(!scheduler.accepts("someone.else"));
    }
}
