// Free-running driver: one OS thread per clock domain.  Neither thread
// waits for the other; a rejected operation backs off and retries on the
// thread's next tick.

use super::{gen_data, HarnessConfig, RunReport};
use crate::error::HarnessError;
use crate::fifo::{AsyncFifo, Domain};
use crate::ClockDomain;
use crossbeam::utils::Backoff;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

struct DomainTally {
   values : Vec<u32>,
   cycles : u64,
   rejects: u64,
   peak   : usize,
}

/// Push the configured data through a FIFO from two threads.
pub fn run_threaded(config: &HarnessConfig) -> Result<RunReport, HarnessError> {
   config.validate()?;
   let seed = config.resolve_seed();
   let mut rng = StdRng::seed_from_u64(seed);
   let data = gen_data(&mut rng, config.items, config.data_max);
   let items = data.len();
   let max_spins = config.max_spins;

   let fifo = AsyncFifo::<u32>::with_capacity(config.capacity)?
      .with_sampling(config.sampling, seed);
   let (mut w, mut r) = fifo.split();

   info!(seed, capacity = config.capacity, items, "threaded run starting");

   let outcome = crossbeam::thread::scope(|s| {
      let producer = s.spawn(move |_| -> Result<DomainTally, HarnessError> {
         let backoff = Backoff::new();
         let mut tally = DomainTally { values: Vec::with_capacity(items), cycles: 0, rejects: 0, peak: 0 };
         for mut value in data {
            let mut spins = 0;
            loop {
               match w.tick().write(value) {
                  Ok(()) => break,
                  Err(e) => {
                     tally.rejects += 1;
                     spins += 1;
                     if spins > max_spins {
                        warn!(ticks = w.cycles(), "producer gave up");
                        return Err(HarnessError::Timeout { domain: Domain::Write, ticks: w.cycles() });
                     }
                     value = e.into_inner();
                     backoff.snooze();
                  }
               }
            }
            backoff.reset();
            tally.values.push(value);
            tally.peak = tally.peak.max(w.level());
         }
         tally.cycles = w.cycles();
         Ok(tally)
      });

      let consumer = s.spawn(move |_| -> Result<DomainTally, HarnessError> {
         let backoff = Backoff::new();
         let mut tally = DomainTally { values: Vec::with_capacity(items), cycles: 0, rejects: 0, peak: 0 };
         let mut spins = 0;
         while tally.values.len() < items {
            match r.tick().read() {
               Ok(v) => {
                  tally.values.push(v);
                  spins = 0;
                  backoff.reset();
               }
               Err(_) => {
                  tally.rejects += 1;
                  spins += 1;
                  if spins > max_spins {
                     warn!(ticks = r.cycles(), "consumer gave up");
                     return Err(HarnessError::Timeout { domain: Domain::Read, ticks: r.cycles() });
                  }
                  backoff.snooze();
               }
            }
         }
         tally.cycles = r.cycles();
         Ok(tally)
      });

      (
         producer.join().map_err(|_| HarnessError::WorkerPanicked(Domain::Write)),
         consumer.join().map_err(|_| HarnessError::WorkerPanicked(Domain::Read)),
      )
   });

   let (produced, consumed) = match outcome {
      Ok((p, c)) => (p??, c??),
      Err(_) => return Err(HarnessError::ScopePanicked),
   };

   let report = RunReport {
      seed,
      written: produced.values,
      read: consumed.values,
      write_cycles: produced.cycles,
      read_cycles: consumed.cycles,
      write_rejects: produced.rejects,
      read_rejects: consumed.rejects,
      peak_level: produced.peak,
      end_ns: None,
   };
   report.check()?;

   info!(
      write_cycles = report.write_cycles,
      read_cycles = report.read_cycles,
      write_rejects = report.write_rejects,
      read_rejects = report.read_rejects,
      "threaded run finished"
   );
   Ok(report)
}
