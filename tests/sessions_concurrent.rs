use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use honest_charts::session::ManualClock;
use honest_charts::{
    ChartSpec, ChartType, Normalizer, NormalizerConfig, Series, SessionError,
};

fn pie(request_id: &str) -> ChartSpec {
    ChartSpec::new(
        ChartType::Pie,
        vec![Series::categories("s", &[("a", 1.0), ("b", 2.0)])],
    )
    .with_request_id(request_id)
}

#[test]
fn independent_requests_progress_in_parallel() {
    let n = Normalizer::default();
    std::thread::scope(|scope| {
        for i in 0..16 {
            let n = &n;
            scope.spawn(move || {
                let spec = pie(&format!("req-{i}"));
                let out = n.normalize(&spec).unwrap();
                assert!(out.needs_confirmation().is_some());
                n.sessions()
                    .mark_educated(&format!("req-{i}"), &ChartType::Pie)
                    .unwrap();
                let out = n.normalize(&spec.confirmed(true)).unwrap();
                assert!(out.normalized().unwrap().overridden);
            });
        }
    });
    assert!(n.sessions().is_empty());
}

#[test]
fn expired_session_asks_again() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let n = Normalizer::with_clock(NormalizerConfig::default(), clock.clone());
    let spec = pie("slow");

    assert!(n.normalize(&spec).unwrap().needs_confirmation().is_some());
    clock.advance(Duration::from_secs(901));

    let out = n.normalize(&spec.clone().confirmed(true)).unwrap();
    let ask = out.needs_confirmation().expect("stale confirmation must not pass");
    assert!(ask.session_expired);

    // A fresh session was opened; confirming it now proceeds.
    let out = n.normalize(&spec.confirmed(true)).unwrap();
    assert!(out.normalized().is_some());
}

#[test]
fn educating_an_expired_session_fails() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let n = Normalizer::with_clock(NormalizerConfig::default(), clock.clone());
    n.normalize(&pie("r")).unwrap();
    clock.advance(Duration::from_secs(1000));
    assert_eq!(
        n.sessions().mark_educated("r", &ChartType::Pie),
        Err(SessionError::Expired {
            request_id: "r".into()
        })
    );
    assert_eq!(
        n.sessions().mark_educated("never", &ChartType::Pie),
        Err(SessionError::NotFound {
            request_id: "never".into()
        })
    );
}

#[test]
fn sweep_drops_idle_sessions() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let n = Normalizer::with_clock(NormalizerConfig::default(), clock.clone());
    for id in ["a", "b", "c"] {
        n.normalize(&pie(id)).unwrap();
    }
    assert_eq!(n.sessions().len(), 3);
    clock.advance(Duration::from_secs(901));
    assert_eq!(n.sessions().sweep(), 3);
    assert!(n.sessions().is_empty());
}

#[test]
fn no_request_id_means_no_session() {
    let n = Normalizer::default();
    let spec = ChartSpec::new(ChartType::Gauge, vec![Series::values("g", &[0.7])]);
    let out = n.normalize(&spec).unwrap();
    let ask = out.needs_confirmation().unwrap();
    assert!(ask.request_id.is_none());
    assert!(n.sessions().is_empty());
}
