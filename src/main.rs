//! Tallyspin Kiosk
//!
//! Terminal demo driving several click-counter widgets against one
//! shared in-memory counter document. The store client is provided
//! late on purpose, so the widgets start inert and arm mid-run.
//!
//! ## Usage
//!
//! ```bash
//! # Run with defaults: 3 widgets, 40 clicks
//! tallyspin-kiosk
//!
//! # More widgets, more clicks, chattier logs
//! tallyspin-kiosk --widgets 5 --clicks 100 -v
//!
//! # Scripted run with every delay shrunk
//! tallyspin-kiosk --fast
//! ```

mod kiosk;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::kiosk::KioskOptions;

/// Tallyspin - shared click tally demo
#[derive(Parser, Debug)]
#[command(name = "tallyspin-kiosk")]
#[command(version = "0.1.0")]
#[command(about = "Drives click-counter widgets against one shared counter")]
struct Cli {
    /// Number of widgets sharing the counter
    #[arg(long, default_value_t = 3)]
    widgets: usize,

    /// Clicks to send round-robin across the widgets
    #[arg(long, default_value_t = 40)]
    clicks: u32,

    /// Gap between clicks in milliseconds (default 120, or 10 with --fast)
    #[arg(long)]
    click_gap_ms: Option<u64>,

    /// Delay before the store client is provided, in milliseconds
    /// (default 250, or 40 with --fast)
    #[arg(long)]
    ready_after_ms: Option<u64>,

    /// Shrink every delay for scripted runs
    #[arg(long)]
    fast: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

impl Cli {
    fn options(&self) -> KioskOptions {
        let (gap, ready, cycles) = if self.fast {
            (10, 40, (25, 15))
        } else {
            (120, 250, (1000, 700))
        };

        KioskOptions {
            widgets: self.widgets,
            clicks: self.clicks,
            click_gap: Duration::from_millis(self.click_gap_ms.unwrap_or(gap)),
            ready_after: Duration::from_millis(self.ready_after_ms.unwrap_or(ready)),
            cycle_durations: (
                Duration::from_millis(cycles.0),
                Duration::from_millis(cycles.1),
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    kiosk::run(cli.options()).await
}
