// fifo-sim: push random data through an asynchronous FIFO and check it
// comes out intact.

use async_fifo::harness::{run_event, run_threaded, HarnessConfig};
use async_fifo::Sampling;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
   /// Both clocks on a simulated timeline (deterministic per seed).
   Event,
   /// One OS thread per clock domain.
   Threaded,
}

#[derive(Debug, Parser)]
#[command(name = "fifo-sim", about = "Drive a dual-clock FIFO model and check the data")]
struct Args {
   /// TOML harness config; built-in defaults when absent.
   #[arg(short, long)]
   config: Option<PathBuf>,

   #[arg(short, long, value_enum, default_value = "event")]
   mode: Mode,

   #[arg(long)]
   items: Option<usize>,

   #[arg(long)]
   capacity: Option<usize>,

   #[arg(long)]
   seed: Option<u64>,

   /// How each domain captures the foreign pointer.
   #[arg(long, value_enum)]
   sampling: Option<Sampling>,
}

fn main() -> ExitCode {
   tracing_subscriber::registry()
      .with(tracing_subscriber::EnvFilter::new(
         std::env::var("RUST_LOG").unwrap_or_else(|_| "async_fifo=info,fifo_sim=info".into()),
      ))
      .with(tracing_subscriber::fmt::layer())
      .init();

   let args = Args::parse();

   let mut config = match &args.config {
      Some(path) => match HarnessConfig::load(path) {
         Ok(c) => c,
         Err(e) => {
            tracing::error!("failed to load {:?}: {}", path, e);
            return ExitCode::FAILURE;
         }
      },
      None => HarnessConfig::default(),
   };
   if let Some(items) = args.items {
      config.items = items;
   }
   if let Some(capacity) = args.capacity {
      config.capacity = capacity;
   }
   if args.seed.is_some() {
      config.seed = args.seed;
   }
   if let Some(sampling) = args.sampling {
      config.sampling = sampling;
   }

   let result = match args.mode {
      Mode::Event => run_event(&config),
      Mode::Threaded => run_threaded(&config),
   };

   match result {
      Ok(report) => {
         println!(
            "ok: {} items, seed {}, {} write / {} read cycles, {} write / {} read rejects, peak level {}/{}",
            report.read.len(),
            report.seed,
            report.write_cycles,
            report.read_cycles,
            report.write_rejects,
            report.read_rejects,
            report.peak_level,
            config.capacity,
         );
         ExitCode::SUCCESS
      }
      Err(e) => {
         tracing::error!("{}", e);
         ExitCode::FAILURE
      }
   }
}
