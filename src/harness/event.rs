// Deterministic two-clock driver.
//
// Both clocks run on a simulated nanosecond timeline.  Rising edges are
// visited in time order; when the two clocks coincide the write edge goes
// first.  The tasks mirror the reference testbench: the writer waits while
// full, writes one word, idles for a random gap; the reader starts late,
// waits while empty, reads one word, idles.

use super::{gen_data, idle, HarnessConfig, RunReport};
use crate::error::HarnessError;
use crate::fifo::{AsyncFifo, Domain};
use crate::ClockDomain;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Yields `(time_ns, domain)` for every rising edge of two free-running
/// clocks, first edge of each at one period.
#[derive(Debug, Clone)]
pub struct TwoClockScheduler {
   periods: [u64; 2],
   next   : [u64; 2],
}

impl TwoClockScheduler {
   pub fn new(write_period_ns: u64, read_period_ns: u64) -> Self {
      Self {
         periods: [write_period_ns, read_period_ns],
         next   : [write_period_ns, read_period_ns],
      }
   }

   pub fn next_edge(&mut self) -> (u64, Domain) {
      let (i, d) = if self.next[0] <= self.next[1] {
         (0, Domain::Write)
      } else {
         (1, Domain::Read)
      };
      let t = self.next[i];
      self.next[i] += self.periods[i];
      (t, d)
   }
}

impl Iterator for TwoClockScheduler {
   type Item = (u64, Domain);

   fn next(&mut self) -> Option<(u64, Domain)> {
      Some(self.next_edge())
   }
}

fn gap(rng: &mut StdRng, config: &HarnessConfig) -> u64 {
   rng.gen_range(config.gap_ns[0]..=config.gap_ns[1])
}

/// Run the testbench scenario on simulated time.
pub fn run_event(config: &HarnessConfig) -> Result<RunReport, HarnessError> {
   config.validate()?;
   let seed = config.resolve_seed();
   let mut rng = StdRng::seed_from_u64(seed);
   let data = gen_data(&mut rng, config.items, config.data_max);

   let fifo = AsyncFifo::<u32>::with_capacity(config.capacity)?
      .with_sampling(config.sampling, seed);
   fifo.reset();
   let (mut w, mut r) = fifo.split();

   info!(seed, capacity = config.capacity, items = data.len(), "event run starting");

   let mut report = RunReport { seed, ..RunReport::default() };
   let mut next_item = 0;
   let mut w_ready = config.reset_ns;
   let mut r_ready = config.reset_ns + config.reader_start_delay_ns;
   let mut end_ns = 0;

   for (now, domain) in TwoClockScheduler::new(config.write_period_ns, config.read_period_ns) {
      if report.read.len() == data.len() {
         break;
      }
      if now > config.max_ns {
         let (domain, ticks) = if next_item < data.len() {
            (Domain::Write, w.cycles())
         } else {
            (Domain::Read, r.cycles())
         };
         warn!(now, %domain, ticks, "event run out of time");
         return Err(HarnessError::Timeout { domain, ticks });
      }
      end_ns = now;

      match domain {
         Domain::Write => {
            if next_item == data.len() || now < w_ready {
               idle(&mut w);
               continue;
            }
            let value = data[next_item];
            match w.tick().write(value) {
               Ok(()) => {
                  debug!(now, value, "write accepted");
                  report.written.push(value);
                  next_item += 1;
                  w_ready = now + gap(&mut rng, config);
                  report.peak_level = report.peak_level.max(w.level());
               }
               Err(_) => report.write_rejects += 1,
            }
         }
         Domain::Read => {
            if now < r_ready {
               idle(&mut r);
               continue;
            }
            match r.tick().read() {
               Ok(value) => {
                  debug!(now, value, "read accepted");
                  report.read.push(value);
                  r_ready = now + gap(&mut rng, config);
               }
               Err(_) => report.read_rejects += 1,
            }
         }
      }
   }

   report.write_cycles = w.cycles();
   report.read_cycles = r.cycles();
   report.end_ns = Some(end_ns);
   report.check()?;

   info!(
      end_ns,
      write_cycles = report.write_cycles,
      read_cycles = report.read_cycles,
      write_rejects = report.write_rejects,
      read_rejects = report.read_rejects,
      "event run finished"
   );
   Ok(report)
}
