//! End-to-end scenarios run on the virtual-time harness and on real threads.

use std::{
  convert::Infallible,
  sync::{Arc, Mutex},
  thread,
};

use rxcore::{atomic::AtomicCounter, prelude::*, testing::*};

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

// ==================== Virtual time ====================

#[test]
fn buffer_with_time_or_count_scenario() {
  init_tracing();
  let scheduler = TestScheduler::new();
  let source = scheduler.create_hot_observable(vec![
    on_next::<i32, &'static str>(205, 1),
    on_next(210, 2),
    on_next(240, 3),
    on_next(280, 4),
    on_next(320, 5),
    on_next(350, 6),
    on_next(370, 7),
    on_next(420, 8),
    on_next(470, 9),
    on_completed(600),
  ]);

  let (c_source, c_scheduler) = (source.clone(), scheduler.clone());
  let observer = scheduler.start_with(move || {
    c_source
      .as_observable()
      .buffer_with_time_or_count(Duration::from_millis(70), 3, c_scheduler)
  });

  assert_eq!(
    observer.messages(),
    vec![
      on_next::<Vec<i32>, &'static str>(240, vec![1, 2, 3]),
      on_next(310, vec![4]),
      on_next(370, vec![5, 6, 7]),
      on_next(440, vec![8]),
      on_next(510, vec![9]),
      on_next(580, vec![]),
      on_next(600, vec![]),
      on_completed(600),
    ]
  );
  assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 600)]);
}

#[test]
fn buffer_disposed_mid_window_emits_nothing_more() {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_hot_observable(vec![
    on_next::<i32, ()>(210, 1),
    on_next(290, 2),
    on_completed(500),
  ]);

  let (c_source, c_scheduler) = (source.clone(), scheduler.clone());
  let observer = scheduler.start_with_timing(
    move || {
      c_source
        .as_observable()
        .buffer_with_time_or_count(Duration::from_millis(50), 5, c_scheduler)
    },
    CREATED,
    SUBSCRIBED,
    300,
  );

  assert_eq!(observer.messages(), vec![on_next::<Vec<i32>, ()>(250, vec![1])]);
  assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 300)]);
  assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn hot_source_misses_events_before_subscription() {
  let scheduler = TestScheduler::new();
  let hot = scheduler.create_hot_observable(vec![
    on_next::<char, ()>(150, 'a'),
    on_next(250, 'b'),
    on_next(350, 'c'),
  ]);

  let c_hot = hot.clone();
  let observer =
    scheduler.start_with_timing(move || c_hot.as_observable(), CREATED, SUBSCRIBED, 300);

  assert_eq!(observer.messages(), vec![on_next::<char, ()>(250, 'b')]);
  assert_eq!(hot.subscriptions(), vec![SubscriptionRecord::new(200, 300)]);
}

#[test]
fn cold_source_is_relative_to_subscription() {
  let scheduler = TestScheduler::new();
  let cold = scheduler.create_cold_observable(vec![
    on_next::<char, ()>(50, 'x'),
    on_next(150, 'y'),
    on_completed(250),
  ]);

  let c_cold = cold.clone();
  let observer = scheduler.start_with(move || c_cold.as_observable());

  assert_eq!(
    observer.messages(),
    vec![on_next::<char, ()>(250, 'x'), on_next(350, 'y'), on_completed(450)]
  );
  assert_eq!(cold.subscriptions(), vec![SubscriptionRecord::new(200, 450)]);
}

#[test]
fn open_subscription_is_infinite() {
  let scheduler = TestScheduler::new();
  let hot = scheduler.create_hot_observable::<i32, ()>(vec![]);
  let subscription = hot.as_observable().subscribe(|_| {});
  scheduler.advance_to(40);
  assert_eq!(hot.subscriptions(), vec![SubscriptionRecord::open(0)]);
  assert_eq!(hot.subscriptions()[0].unsubscribe, INFINITE);
  subscription.dispose();
  assert_eq!(hot.subscriptions(), vec![SubscriptionRecord::new(0, 40)]);
}

fn round_trip(messages: Vec<Recorded<Notification<i32, &'static str>>>) {
  let scheduler = TestScheduler::new();
  let source = scheduler.create_cold_observable(messages.clone());
  let c_source = source.clone();
  let observer =
    scheduler.start_with(move || c_source.as_observable().materialize().dematerialize());

  let shifted: Vec<_> = messages
    .into_iter()
    .map(|r| Recorded::new(r.time + SUBSCRIBED, r.value))
    .collect();
  assert_eq!(observer.messages(), shifted);
}

#[test]
fn materialize_round_trips_empty() { round_trip(vec![on_completed(30)]); }

#[test]
fn materialize_round_trips_single_value() {
  round_trip(vec![on_next(10, 42), on_completed(20)]);
}

#[test]
fn materialize_round_trips_error() {
  round_trip(vec![on_next(10, 1), on_next(15, 2), on_error(40, "failed")]);
}

#[test]
fn materialize_records_terminal_as_value() {
  let scheduler = TestScheduler::new();
  let source =
    scheduler.create_cold_observable(vec![on_next::<i32, &'static str>(10, 7), on_error(20, "x")]);
  let c_source = source.clone();
  let observer = scheduler.start_with(move || c_source.as_observable().materialize());
  assert_eq!(
    observer.messages(),
    vec![
      on_next::<Notification<i32, &'static str>, Infallible>(210, Notification::Next(7)),
      on_next(220, Notification::Error("x")),
      on_completed(220),
    ]
  );
}

#[test]
fn generate_ticks_through_the_harness() {
  let scheduler = TestScheduler::new();
  let c_scheduler = scheduler.clone();
  let observer = scheduler
    .start_with(move || observable::generate(0, |v| *v < 3, |v| v + 1, c_scheduler).map(|v| v * 2));
  assert_eq!(
    observer.messages(),
    vec![
      on_next::<i32, Infallible>(200, 0),
      on_next(200, 2),
      on_next(200, 4),
      on_completed(200),
    ]
  );
}

#[test]
fn interval_disposed_by_harness() {
  let scheduler = TestScheduler::new();
  let c_scheduler = scheduler.clone();
  let observer = scheduler.start_with_timing(
    move || observable::interval(Duration::from_millis(100), c_scheduler),
    CREATED,
    SUBSCRIBED,
    550,
  );
  assert_eq!(
    observer.messages(),
    vec![on_next::<u64, Infallible>(300, 0), on_next(400, 1), on_next(500, 2)]
  );
  assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn delay_subscription_shifts_the_subscription() {
  let scheduler = TestScheduler::new();
  let source =
    scheduler.create_cold_observable(vec![on_next::<i32, ()>(10, 1), on_completed(20)]);
  let (c_source, c_scheduler) = (source.clone(), scheduler.clone());
  let observer = scheduler.start_with(move || {
    c_source
      .as_observable()
      .delay_subscription(Duration::from_millis(30), c_scheduler)
  });
  assert_eq!(observer.messages(), vec![on_next::<i32, ()>(240, 1), on_completed(250)]);
  assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(230, 250)]);
}

// ==================== Subjects ====================

#[test]
fn subject_reentrant_emission_completes() {
  let subject = PublishSubject::<i32>::new();
  let log = Arc::new(Mutex::new(Vec::new()));
  let (l1, l2) = (log.clone(), log.clone());
  let inner = subject.clone();
  subject.as_observable().subscribe_all(
    move |v| {
      l1.lock().unwrap().push(format!("{v}"));
      if v == 0 {
        inner.next(1);
        inner.complete();
      }
    },
    |_| {},
    move || l2.lock().unwrap().push("completed".to_owned()),
  );

  subject.next(0);

  assert_eq!(*log.lock().unwrap(), vec!["0", "1", "completed"]);
  assert!(subject.is_terminated());
}

#[test]
fn has_observers_follows_live_subscriptions() {
  let subject = BehaviorSubject::<i32>::new(0);
  assert!(!subject.has_observers());

  let subscriptions: Vec<_> = (0..3).map(|_| subject.as_observable().subscribe(|_| {})).collect();
  assert!(subject.has_observers());
  assert_eq!(subject.observer_count(), 3);

  let late = subject.as_observable().subscribe(|_| {});
  subscriptions[1].dispose();
  subscriptions[0].dispose();
  assert!(subject.has_observers());
  subscriptions[2].dispose();
  assert!(subject.has_observers());
  late.dispose();
  assert!(!subject.has_observers());
}

#[test]
fn subscriptions_from_many_threads() {
  init_tracing();
  let subject = PublishSubject::<i32>::new();
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let subject = subject.clone();
      thread::spawn(move || {
        for _ in 0..50 {
          subject.as_observable().subscribe(|_| {}).dispose();
          subject.next(1);
        }
      })
    })
    .collect();
  for h in handles {
    h.join().unwrap();
  }
  assert!(!subject.has_observers());
}

// ==================== Threads ====================

#[test]
fn counter_totals_across_threads() {
  let counter = Arc::new(AtomicCounter::new(0));
  let handles: Vec<_> = (0..16)
    .map(|_| {
      let counter = counter.clone();
      thread::spawn(move || {
        counter.add(1);
      })
    })
    .collect();
  for h in handles {
    h.join().unwrap();
  }
  assert_eq!(counter.load(), 16);
}

#[cfg(feature = "pool-scheduler")]
#[test]
fn interval_on_pool_then_take() {
  use std::sync::mpsc::channel;

  init_tracing();
  let pool = PoolScheduler::concurrent().unwrap();
  let (tx, rx) = channel();
  let done = tx.clone();
  observable::interval(Duration::from_millis(2), pool)
    .take(5)
    .subscribe_all(
      move |v| tx.send(Some(v)).unwrap(),
      |_| {},
      move || done.send(None).unwrap(),
    );

  let mut ticks = Vec::new();
  while let Some(v) = rx.recv().unwrap() {
    ticks.push(v);
  }
  assert_eq!(ticks, vec![0, 1, 2, 3, 4]);
}

#[cfg(feature = "pool-scheduler")]
#[test]
fn buffer_on_serial_pool() {
  use std::sync::mpsc::channel;

  let pool = PoolScheduler::serial().unwrap();
  let (tx, rx) = channel();
  let done = tx.clone();
  observable::from_iter(1..=7)
    .subscribe_on(pool.clone())
    .buffer_with_time_or_count(Duration::from_secs(60), 3, pool)
    .subscribe_all(
      move |b| tx.send(Some(b)).unwrap(),
      |_| {},
      move || done.send(None).unwrap(),
    );

  let mut buffers = Vec::new();
  while let Some(b) = rx.recv().unwrap() {
    buffers.push(b);
  }
  assert_eq!(buffers, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
}
