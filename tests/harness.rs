// async_fifo/tests/harness.rs

use async_fifo::harness::{idle, run_event, run_threaded, HarnessConfig, RunReport, TwoClockScheduler};
use async_fifo::{AsyncFifo, ClockDomain, Domain, HarnessError, Sampling};


fn seeded(seed: u64) -> HarnessConfig {
   HarnessConfig { seed: Some(seed), ..HarnessConfig::default() }
}

#[test]
fn test_scheduler_orders_edges_and_breaks_ties_to_write() {
   let edges: Vec<(u64, Domain)> = TwoClockScheduler::new(7, 13).take(6).collect();
   assert_eq!(
      edges,
      vec![
         (7, Domain::Write),
         (13, Domain::Read),
         (14, Domain::Write),
         (21, Domain::Write),
         (26, Domain::Read),
         (28, Domain::Write),
      ]
   );

   let mut s = TwoClockScheduler::new(3, 3);
   assert_eq!(s.next_edge(), (3, Domain::Write));
   assert_eq!(s.next_edge(), (3, Domain::Read));
}

#[test]
fn test_event_run_default_testbench() {
   let report = run_event(&seeded(1)).unwrap();
   assert_eq!(report.read, report.written);
   assert_eq!(report.read.len(), 8);
   assert!(report.read.iter().all(|&v| v <= 255));
   assert!(report.peak_level <= 16);
   assert!(report.end_ns.unwrap() > 150, "reader starts 100 ns after a 50 ns reset");
}

#[test]
fn test_event_run_is_deterministic_per_seed() {
   let a = run_event(&seeded(99)).unwrap();
   let b = run_event(&seeded(99)).unwrap();
   assert_eq!(a, b);
}

#[test]
fn test_event_run_backpressure_with_small_fifo() {
   let config = HarnessConfig {
      capacity: 2,
      items: 200,
      write_period_ns: 3,
      read_period_ns: 29,
      gap_ns: [0, 0],
      reader_start_delay_ns: 0,
      sampling: Sampling::Skewed,
      ..seeded(5)
   };
   let report = run_event(&config).unwrap();
   assert_eq!(report.read.len(), 200);
   assert!(report.write_rejects > 0, "fast writer must hit full");
   assert_eq!(report.peak_level, 2);
}

#[test]
fn test_event_run_times_out() {
   let config = HarnessConfig { max_ns: 60, ..seeded(3) };
   match run_event(&config) {
      Err(HarnessError::Timeout { .. }) => {}
      other => panic!("expected timeout, got {:?}", other),
   }
}

#[test]
fn test_event_run_rejects_bad_capacity() {
   let config = HarnessConfig { capacity: 6, ..seeded(0) };
   assert!(matches!(run_event(&config), Err(HarnessError::Capacity(_))));
}

#[test]
fn test_threaded_run() {
   let config = HarnessConfig { items: 10_000, capacity: 8, ..seeded(11) };
   let report = run_threaded(&config).unwrap();
   assert_eq!(report.read.len(), 10_000);
   assert!(report.peak_level <= 8);
   assert_eq!(report.end_ns, None);
}

#[test]
fn test_config_from_toml() {
   let config = HarnessConfig::from_toml_str(
      r#"
      capacity = 32
      items = 100
      gap_ns = [1, 3]
      seed = 42
      sampling = "skewed"
      "#,
   )
   .unwrap();
   assert_eq!(config.capacity, 32);
   assert_eq!(config.items, 100);
   assert_eq!(config.gap_ns, [1, 3]);
   assert_eq!(config.seed, Some(42));
   assert_eq!(config.sampling, Sampling::Skewed);
   assert_eq!(config.write_period_ns, 7, "unspecified keys keep defaults");
}

#[test]
fn test_config_errors() {
   assert!(matches!(
      HarnessConfig::from_toml_str("capacity = 8\nbogus = 1"),
      Err(HarnessError::Config(_))
   ));
   assert!(matches!(
      HarnessConfig::from_toml_str("gap_ns = [9, 2]"),
      Err(HarnessError::Invalid(_))
   ));
   assert!(matches!(
      HarnessConfig::from_toml_str("read_period_ns = 0"),
      Err(HarnessError::Invalid(_))
   ));
   assert!(matches!(HarnessConfig::load("/nonexistent/fifo.toml"), Err(HarnessError::Io(_))));
}

#[test]
fn test_report_check_finds_first_mismatch() {
   let report = RunReport { written: vec![1, 2, 3], read: vec![1, 5, 3], ..RunReport::default() };
   match report.check() {
      Err(HarnessError::Mismatch { index, expected, got }) => assert_eq!((index, expected, got), (1, 2, 5)),
      other => panic!("unexpected {:?}", other),
   }

   let short = RunReport { written: vec![1, 2], read: vec![1], ..RunReport::default() };
   assert!(matches!(short.check(), Err(HarnessError::CountMismatch { written: 2, read: 1 })));
}

#[test]
fn test_idle_ticks_complete_reset() {
   let fifo = AsyncFifo::<u8>::new(4).unwrap();
   fifo.reset();
   let handle = fifo.reset_handle();
   let (mut w, mut r) = fifo.split();
   idle(&mut w);
   assert!(w.is_resetting());
   idle(&mut r);
   assert!(handle.is_settled());
   assert_eq!((w.cycles(), r.cycles()), (1, 1));
}

#[test]
fn test_worker_panic_errors_name_the_right_domain() {
   assert_eq!(HarnessError::WorkerPanicked(Domain::Write).to_string(), "write domain worker panicked");
   assert_eq!(HarnessError::WorkerPanicked(Domain::Read).to_string(), "read domain worker panicked");

   let msg = HarnessError::ScopePanicked.to_string();
   assert!(!msg.contains("write") && !msg.contains("read"), "scope failure blames a domain: {}", msg);
}
