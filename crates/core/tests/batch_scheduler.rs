//! Wave boundaries and failure isolation of the batch scheduler

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rewardpilot_core::{AccountRunReport, AccountRunner, BatchScheduler, SupervisorState};
use rewardpilot_domain::Account;
use support::account;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Started(usize),
    Finished(usize),
}

#[derive(Default)]
struct TrackingRunner {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    events: Mutex<Vec<Event>>,
    panic_on: Option<usize>,
    cancel_on: Option<(usize, CancellationToken)>,
}

#[async_trait]
impl AccountRunner for TrackingRunner {
    async fn run_account(&self, account: Account) -> AccountRunReport {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.events.lock().push(Event::Started(account.index));

        // Later accounts finish first to show a wave waits for its slowest.
        tokio::time::sleep(Duration::from_millis(30 - 5 * (account.index as u64 % 2))).await;

        if let Some((index, cancel)) = &self.cancel_on {
            if *index == account.index {
                cancel.cancel();
            }
        }
        self.events.lock().push(Event::Finished(account.index));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        assert_ne!(self.panic_on, Some(account.index), "runner exploded");

        let mut report = AccountRunReport::new(&account.address);
        report.advance(SupervisorState::Steady);
        report
    }
}

fn accounts(n: usize) -> Vec<Account> {
    (0..n).map(account).collect()
}

#[tokio::test]
async fn waves_never_exceed_the_limit() {
    let runner = Arc::new(TrackingRunner::default());
    let scheduler = BatchScheduler::new(runner.clone());

    let reports = scheduler.run_all(accounts(5), 2).await;

    assert_eq!(reports.len(), 5);
    assert!(reports.iter().all(AccountRunReport::succeeded));
    assert_eq!(runner.peak.load(Ordering::SeqCst), 2);

    let events = runner.events.lock().clone();
    let position = |event: Event| events.iter().position(|e| *e == event).unwrap();
    // Wave 3 (account 4) starts only after waves 1 and 2 fully settled.
    for finished in 0..4 {
        assert!(position(Event::Finished(finished)) < position(Event::Started(4)));
    }
    assert!(position(Event::Finished(0)) < position(Event::Started(2)));
    assert!(position(Event::Finished(1)) < position(Event::Started(2)));
}

#[tokio::test]
async fn reports_follow_input_order() {
    let runner = Arc::new(TrackingRunner::default());
    let reports = BatchScheduler::new(runner).run_all(accounts(3), 3).await;

    let addresses: Vec<_> = reports.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(addresses, vec!["Addr0", "Addr1", "Addr2"]);
}

#[tokio::test]
async fn zero_concurrency_runs_one_at_a_time() {
    let runner = Arc::new(TrackingRunner::default());
    let reports = BatchScheduler::new(runner.clone()).run_all(accounts(3), 0).await;

    assert_eq!(reports.len(), 3);
    assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_account_is_reported_and_batch_continues() {
    let runner = Arc::new(TrackingRunner { panic_on: Some(1), ..TrackingRunner::default() });
    let reports = BatchScheduler::new(runner).run_all(accounts(4), 2).await;

    assert_eq!(reports.len(), 4);
    assert!(!reports[1].succeeded());
    assert_eq!(reports[1].address, "Addr1");
    assert!(reports.iter().enumerate().filter(|(i, _)| *i != 1).all(|(_, r)| r.succeeded()));
}

#[tokio::test]
async fn cancellation_during_a_wave_stops_later_waves() {
    let cancel = CancellationToken::new();
    let runner = Arc::new(TrackingRunner {
        cancel_on: Some((1, cancel.clone())),
        ..TrackingRunner::default()
    });
    let scheduler = BatchScheduler::new(runner.clone()).with_cancellation(cancel);

    let reports = scheduler.run_all(accounts(5), 2).await;

    // The first wave settles; waves two and three never start.
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(AccountRunReport::succeeded));
    let events = runner.events.lock().clone();
    assert!(!events.contains(&Event::Started(2)));
    assert!(!events.contains(&Event::Started(4)));
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let runner = Arc::new(TrackingRunner::default());

    let scheduler = BatchScheduler::new(runner.clone()).with_cancellation(cancel);

    let reports = scheduler.run_all(accounts(3), 2).await;

    assert!(reports.is_empty());
    assert!(runner.events.lock().is_empty());
}
