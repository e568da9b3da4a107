use anyhow::Context;
use clap::Parser;
use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

mod ac_filter;
mod cli;
mod ownship;
mod pacing;
mod record;
mod replay;

fn main() {
    let opts = cli::Opts::parse();

    // init and customization of the trace system
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if opts.verbose { "debug" } else { "info" }),
    )
        .format(|buf, record| {
            let level_color = match record.level() {
                log::Level::Error => Some(anstyle::Color::from(anstyle::AnsiColor::Red)),
                log::Level::Warn => Some(anstyle::Color::from(anstyle::AnsiColor::Yellow)),
                _ => None
            };
            let level_style = anstyle::Style::new().fg_color(level_color);
            writeln!(
                buf,
                "[{}-{}{}{:#}-{}:{}] {}",
                chrono::Local::now().format("%H:%M:%S%.6f"),
                level_style,
                record.level(),
                level_style,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();

    log::info!("Launching {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&opts) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}


fn run(opts: &cli::Opts) -> anyhow::Result<()> {
    // cancellation flag raised once by the operator interrupt
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install the interrupt handler")?;

    // list of selected aircraft
    let filter = ac_filter::AcFilter::new(opts.aircraft.as_deref(), opts.aircraft_decimal.as_deref())?;
    if !filter.is_empty() {
        log::info!("Selected aircraft: {:?}", filter.ids());
    }

    // the GPS listener only runs when asked to
    let tracker = if opts.ownship {
        Some(ownship::OwnshipTracker::new()?)
    } else {
        None
    };

    let mut input = replay::Input::open(opts.in_file.as_deref())?;
    let mut replay = replay::Replay::new(
        &opts.host,
        opts.port,
        opts.weather_port,
        filter,
        opts.historic,
        tracker,
        opts.print_ownship,
        cancel.clone(),
    )?;

    replay.run(&mut input, opts.buf_period, opts.loop_input)?;

    if cancel.load(Ordering::Relaxed) {
        log::info!("Interrupted, shutting down");
    }
    replay.log_summary();
    Ok(())
}
