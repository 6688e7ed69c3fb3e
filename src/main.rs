use anyhow::Context;
use clap::Parser;
use std::time::Duration;

use claude_usage_monitor::cli::Args;
use claude_usage_monitor::display::{print_json_output, print_text_output};
use claude_usage_monitor::monitor::UsageMonitor;
use claude_usage_monitor::scheduler::Scheduler;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config();
    let refresh = Duration::from_secs(config.refresh_interval_seconds.max(1));
    let monitor = UsageMonitor::new(config);

    if args.watch {
        let json = args.json;
        let show_blocks = args.show_blocks;
        let mut scheduler = Scheduler::spawn(monitor);

        // Render one snapshot immediately, then follow the ticker.
        let first = scheduler
            .run_once()
            .recv()
            .context("worker thread gone")?
            .context("initial compute failed")?;
        render(&first, json, show_blocks)?;

        scheduler.start_periodic(refresh, move |snapshot| match snapshot {
            Ok(metrics) => {
                if let Err(e) = render(&metrics, json, show_blocks) {
                    tracing::warn!(error = %e, "render failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "compute failed"),
        });

        // The worker does everything; park the main thread.
        loop {
            std::thread::park();
        }
    }

    let mut monitor = monitor;
    let metrics = monitor.compute_current().context("compute usage metrics")?;
    render(&metrics, args.json, args.show_blocks)
}

fn render(
    metrics: &claude_usage_monitor::models::Metrics,
    json: bool,
    show_blocks: bool,
) -> anyhow::Result<()> {
    if json {
        print_json_output(metrics)?;
    } else {
        print_text_output(metrics, show_blocks);
    }
    Ok(())
}
