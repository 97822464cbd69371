//! Two-step "explain, then allow" protocol for banned chart types.
//!
//! Each (request id, banned type) pair owns one session:
//!
//! ```text
//! PROPOSED --mark_educated--> EDUCATED --resubmit(confirmed)--> CONFIRMED
//!     \                           \
//!      +---- TTL / complete -------+--> EXPIRED (discarded)
//! ```
//!
//! A confirmed resubmission straight from PROPOSED counts as educated. An
//! expired or unknown session never fails a call; the caller simply gets a
//! fresh `NeedsConfirmation`.
//!
//! Sessions live in a sharded concurrent map, so transitions on one request
//! id never block another.

use ahash::RandomState;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::classify::{Substitute, SubstitutionDecision};
use crate::error::SessionError;
use crate::models::ChartType;

/// Time source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += TimeDelta::from_std(by).unwrap_or(TimeDelta::zero());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Proposed,
    Educated,
    Confirmed,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    request_id: String,
    chart: String,
}

impl SessionKey {
    fn new(request_id: &str, chart: &ChartType) -> Self {
        Self {
            request_id: request_id.to_string(),
            chart: chart.token().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideSession {
    pub request_id: String,
    pub banned_type: ChartType,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub educated_at: Option<DateTime<Utc>>,
    pub touched_at: DateTime<Utc>,
}

impl OverrideSession {
    fn proposed(request_id: &str, banned_type: &ChartType, now: DateTime<Utc>) -> Self {
        Self {
            request_id: request_id.to_string(),
            banned_type: banned_type.clone(),
            state: SessionState::Proposed,
            created_at: now,
            educated_at: None,
            touched_at: now,
        }
    }
}

/// Control signal: explain the rationale, then resubmit with `confirmed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedsConfirmation {
    pub request_id: Option<String>,
    pub banned_type: ChartType,
    pub substitute_type: Option<Substitute>,
    pub rationale: String,
    /// The confirmation referenced a stale or unknown session.
    #[serde(default)]
    pub session_expired: bool,
}

impl NeedsConfirmation {
    fn new(request_id: Option<&str>, decision: &SubstitutionDecision, expired: bool) -> Self {
        Self {
            request_id: request_id.map(str::to_string),
            banned_type: decision.chart_type.clone(),
            substitute_type: decision.substitute_type,
            rationale: decision.rationale.clone(),
            session_expired: expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Proceed(OverrideSession),
    NeedsConfirmation(NeedsConfirmation),
}

pub struct OverrideSessions<C: Clock = SystemClock> {
    table: DashMap<SessionKey, OverrideSession, RandomState>,
    ttl: TimeDelta,
    sweep_every: usize,
    calls: AtomicUsize,
    clock: C,
}

impl OverrideSessions<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> OverrideSessions<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            table: DashMap::with_hasher(RandomState::new()),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            sweep_every: 64,
            calls: AtomicUsize::new(0),
            clock,
        }
    }

    /// Sweep expired sessions every `n` admissions (0 disables).
    pub fn sweep_every(mut self, n: usize) -> Self {
        self.sweep_every = n;
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn is_expired(&self, session: &OverrideSession, now: DateTime<Utc>) -> bool {
        now - session.touched_at > self.ttl
    }

    /// Gate a banned chart type for a request.
    ///
    /// Without a request id there is nothing to key a session on, so the
    /// caller always gets `NeedsConfirmation`.
    pub fn admit(
        &self,
        decision: &SubstitutionDecision,
        request_id: Option<&str>,
        confirmed: bool,
    ) -> Admission {
        self.maybe_sweep();
        let now = self.clock.now();
        let Some(request_id) = request_id else {
            return Admission::NeedsConfirmation(NeedsConfirmation::new(None, decision, false));
        };
        let key = SessionKey::new(request_id, &decision.chart_type);

        match self.table.entry(key) {
            Entry::Occupied(mut occ) => {
                if self.is_expired(occ.get(), now) {
                    log::info!(
                        "override session {request_id}/{} expired; starting over",
                        decision.chart_type
                    );
                    occ.insert(OverrideSession::proposed(
                        request_id,
                        &decision.chart_type,
                        now,
                    ));
                    return Admission::NeedsConfirmation(NeedsConfirmation::new(
                        Some(request_id),
                        decision,
                        confirmed,
                    ));
                }
                let session = occ.get_mut();
                session.touched_at = now;
                if !confirmed {
                    return Admission::NeedsConfirmation(NeedsConfirmation::new(
                        Some(request_id),
                        decision,
                        false,
                    ));
                }
                if session.educated_at.is_none() {
                    session.educated_at = Some(now);
                }
                session.state = SessionState::Confirmed;
                log::info!(
                    "override session {request_id}/{} confirmed",
                    decision.chart_type
                );
                Admission::Proceed(session.clone())
            }
            Entry::Vacant(vac) => {
                if confirmed {
                    log::info!(
                        "confirmation for unknown session {request_id}/{}; treating as new",
                        decision.chart_type
                    );
                } else {
                    log::info!(
                        "override session {request_id}/{} proposed",
                        decision.chart_type
                    );
                }
                vac.insert(OverrideSession::proposed(
                    request_id,
                    &decision.chart_type,
                    now,
                ));
                Admission::NeedsConfirmation(NeedsConfirmation::new(
                    Some(request_id),
                    decision,
                    confirmed,
                ))
            }
        }
    }

    /// Record that the rationale has been shown to the end user.
    pub fn mark_educated(
        &self,
        request_id: &str,
        banned_type: &ChartType,
    ) -> Result<SessionState, SessionError> {
        let now = self.clock.now();
        match self.table.entry(SessionKey::new(request_id, banned_type)) {
            Entry::Vacant(_) => Err(SessionError::NotFound {
                request_id: request_id.to_string(),
            }),
            Entry::Occupied(occ) if self.is_expired(occ.get(), now) => {
                occ.remove();
                Err(SessionError::Expired {
                    request_id: request_id.to_string(),
                })
            }
            Entry::Occupied(mut occ) => {
                let session = occ.get_mut();
                if session.state == SessionState::Confirmed {
                    return Err(SessionError::AlreadyConfirmed {
                        request_id: request_id.to_string(),
                    });
                }
                session.state = SessionState::Educated;
                session.educated_at = Some(now);
                session.touched_at = now;
                log::info!("override session {request_id}/{banned_type} educated");
                Ok(SessionState::Educated)
            }
        }
    }

    /// Current state; a lapsed session reads as `Expired` until swept.
    pub fn state(&self, request_id: &str, banned_type: &ChartType) -> Option<SessionState> {
        let now = self.clock.now();
        self.table
            .get(&SessionKey::new(request_id, banned_type))
            .map(|s| {
                if self.is_expired(&s, now) {
                    SessionState::Expired
                } else {
                    s.state
                }
            })
    }

    /// Snapshot of a session, expired or not.
    pub fn get(&self, request_id: &str, banned_type: &ChartType) -> Option<OverrideSession> {
        self.table
            .get(&SessionKey::new(request_id, banned_type))
            .map(|s| s.clone())
    }

    /// Discard every session owned by a finished request.
    pub fn complete(&self, request_id: &str) -> usize {
        let keys: Vec<SessionKey> = self
            .table
            .iter()
            .filter(|e| e.key().request_id == request_id)
            .map(|e| e.key().clone())
            .collect();
        keys.iter()
            .filter(|k| self.table.remove(*k).is_some())
            .count()
    }

    /// Drop sessions idle past the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let stale: Vec<SessionKey> = self
            .table
            .iter()
            .filter(|e| self.is_expired(e.value(), now))
            .map(|e| e.key().clone())
            .collect();
        let removed = stale
            .iter()
            .filter(|k| {
                self.table
                    .remove_if(*k, |_, s| self.is_expired(s, now))
                    .is_some()
            })
            .count();
        if removed > 0 {
            log::info!("swept {removed} expired override session(s)");
        }
        removed
    }

    fn maybe_sweep(&self) {
        if self.sweep_every == 0 {
            return;
        }
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.sweep_every == 0 {
            self.sweep();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn manual() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc::now()))
    }

    #[test]
    fn propose_then_confirm() {
        let clock = manual();
        let sessions = OverrideSessions::with_clock(Duration::from_secs(60), clock.clone());
        let pie = classify(&ChartType::Pie, 1);

        let first = sessions.admit(&pie, Some("r1"), false);
        assert!(matches!(first, Admission::NeedsConfirmation(_)));
        assert_eq!(
            sessions.state("r1", &ChartType::Pie),
            Some(SessionState::Proposed)
        );

        assert_eq!(
            sessions.mark_educated("r1", &ChartType::Pie),
            Ok(SessionState::Educated)
        );
        let snapshot = sessions.get("r1", &ChartType::Pie).expect("session exists");
        assert_eq!(snapshot.state, SessionState::Educated);
        assert_eq!(snapshot.request_id, "r1");
        assert!(snapshot.educated_at.is_some());
        assert!(sessions.get("r1", &ChartType::Gauge).is_none());

        match sessions.admit(&pie, Some("r1"), true) {
            Admission::Proceed(s) => {
                assert_eq!(s.state, SessionState::Confirmed);
                assert!(s.educated_at.is_some());
            }
            other => panic!("expected proceed, got {other:?}"),
        }
    }

    #[test]
    fn unconfirmed_resubmission_keeps_asking() {
        let sessions = OverrideSessions::new(Duration::from_secs(60));
        let pie = classify(&ChartType::Pie, 1);
        sessions.admit(&pie, Some("r"), false);
        assert!(matches!(
            sessions.admit(&pie, Some("r"), false),
            Admission::NeedsConfirmation(_)
        ));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn ttl_expiry_restarts_protocol() {
        let clock = manual();
        let sessions = OverrideSessions::with_clock(Duration::from_secs(10), clock.clone());
        let gauge = classify(&ChartType::Gauge, 1);
        sessions.admit(&gauge, Some("r"), false);
        clock.advance(Duration::from_secs(11));
        assert_eq!(
            sessions.state("r", &ChartType::Gauge),
            Some(SessionState::Expired)
        );
        match sessions.admit(&gauge, Some("r"), true) {
            Admission::NeedsConfirmation(n) => assert!(n.session_expired),
            other => panic!("expected fresh confirmation, got {other:?}"),
        }
        assert_eq!(
            sessions.state("r", &ChartType::Gauge),
            Some(SessionState::Proposed)
        );
    }

    #[test]
    fn mark_educated_errors() {
        let clock = manual();
        let sessions = OverrideSessions::with_clock(Duration::from_secs(5), clock.clone());
        assert!(matches!(
            sessions.mark_educated("nope", &ChartType::Pie),
            Err(SessionError::NotFound { .. })
        ));
        let pie = classify(&ChartType::Pie, 1);
        sessions.admit(&pie, Some("r"), false);
        clock.advance(Duration::from_secs(6));
        assert!(matches!(
            sessions.mark_educated("r", &ChartType::Pie),
            Err(SessionError::Expired { .. })
        ));
        assert!(sessions.is_empty());
    }

    #[test]
    fn sweep_and_complete() {
        let clock = manual();
        let sessions =
            OverrideSessions::with_clock(Duration::from_secs(5), clock.clone()).sweep_every(0);
        let pie = classify(&ChartType::Pie, 1);
        let radar = classify(&ChartType::Radar, 1);
        sessions.admit(&pie, Some("a"), false);
        sessions.admit(&radar, Some("a"), false);
        sessions.admit(&pie, Some("b"), false);
        assert_eq!(sessions.complete("a"), 2);
        assert_eq!(sessions.len(), 1);
        clock.advance(Duration::from_secs(6));
        assert_eq!(sessions.sweep(), 1);
        assert!(sessions.is_empty());
    }

    #[test]
    fn no_request_id_means_no_session() {
        let sessions = OverrideSessions::new(Duration::from_secs(60));
        let pie = classify(&ChartType::Pie, 1);
        assert!(matches!(
            sessions.admit(&pie, None, true),
            Admission::NeedsConfirmation(_)
        ));
        assert!(sessions.is_empty());
    }
}
