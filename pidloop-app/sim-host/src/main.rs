use clap::Parser;
use core::cell::Cell;
use embassy_time::Duration;
use pidloop_core::pid::{
    Clock, EmbassyClock, Mode, PidCommand, PidConfig, PidController, ProcessVars, Tunings,
};
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};
use tracing::{debug, error, info};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// JSON `PidConfig`; overrides the gain flags
    #[clap(long)]
    config: Option<PathBuf>,
    /// JSON list of `{ "at_ms": .., "command": { "pc": .. } }` steps
    #[clap(long)]
    script: Option<PathBuf>,
    #[clap(long, default_value_t = 2.0)]
    kp: f64,
    #[clap(long, default_value_t = 0.5)]
    ki: f64,
    #[clap(long, default_value_t = 0.1)]
    kd: f64,
    /// target process value
    #[clap(long, default_value_t = 60.0)]
    setpoint: f64,
    /// starting (and ambient) process value
    #[clap(long, default_value_t = 20.0)]
    initial: f64,
    #[clap(long, default_value_t = 30_000)]
    duration_ms: u32,
    /// how often the loop polls the controller
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    poll_ms: u32,
    /// plant time constant
    #[clap(long, default_value_t = 5_000.0)]
    tau_ms: f64,
    /// plant steady-state gain per unit of output
    #[clap(long, default_value_t = 0.4)]
    gain: f64,
    /// initial simulated counter value, e.g. close to u32::MAX
    #[clap(long, default_value_t = 0)]
    start_ms: u32,
    /// log a status line every N controller updates
    #[clap(long, default_value_t = 10)]
    log_every: u32,
    /// poll against the wall clock instead of a simulated counter
    #[clap(long)]
    realtime: bool,
}

#[derive(Debug, Deserialize)]
struct ScriptStep
{
    at_ms: u32,
    command: PidCommand,
}

/// First-order lag: the process relaxes toward `ambient + gain * output`.
struct FirstOrderPlant
{
    ambient: f64,
    gain: f64,
    tau_ms: f64,
}

impl FirstOrderPlant
{
    fn step(
        &self,
        value: f64,
        output: f64,
        dt_ms: u32,
    ) -> f64
    {
        let target = self.ambient + self.gain * output;
        let decay = (-f64::from(dt_ms) / self.tau_ms).exp();
        target + (value - target) * decay
    }
}

/// Millisecond counter advanced by the loop itself.
struct SimClock
{
    now: Cell<u32>,
}

impl Clock for SimClock
{
    fn now_ms(&self) -> u32
    {
        self.now.get()
    }
}

#[derive(Debug, Default)]
struct Summary
{
    polls: u32,
    updates: u32,
    rejected: u32,
    peak: f64,
}

fn load_config(opts: &Opts) -> Result<PidConfig, Box<dyn Error>>
{
    let config = match &opts.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => {
            let mut config = PidConfig::new(Tunings::new(opts.kp, opts.ki, opts.kd));
            config.mode = Mode::Automatic;
            config
        }
    };
    config.validate()?;
    Ok(config)
}

fn load_script(opts: &Opts) -> Result<Vec<ScriptStep>, Box<dyn Error>>
{
    let mut steps: Vec<ScriptStep> = match &opts.script {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    steps.sort_by_key(|step| step.at_ms);
    Ok(steps)
}

/// Poll the controller until `duration_ms` has elapsed on `clock`.
///
/// `wait` advances time by one poll interval, either by bumping the simulated
/// counter or by blocking on the real one.
fn run_loop<C: Clock>(
    opts: &Opts,
    pid: &mut PidController<'_>,
    input: &Cell<f64>,
    output: &Cell<f64>,
    script: &[ScriptStep],
    clock: &C,
    wait: impl Fn(),
) -> Result<Summary, Box<dyn Error>>
{
    let plant = FirstOrderPlant {
        ambient: opts.initial,
        gain: opts.gain,
        tau_ms: opts.tau_ms,
    };
    let start = clock.now_ms();
    let mut summary = Summary {
        peak: input.get(),
        ..Summary::default()
    };
    let mut pending = script.iter().peekable();
    let mut last_poll = start;

    loop {
        let now = clock.now_ms();
        let elapsed = now.wrapping_sub(start);
        if elapsed >= opts.duration_ms {
            break;
        }

        input.set(plant.step(input.get(), output.get(), now.wrapping_sub(last_poll)));
        last_poll = now;
        summary.peak = summary.peak.max(input.get());

        while let Some(step) = pending.next_if(|step| step.at_ms <= elapsed) {
            match pid.apply(step.command) {
                Ok(outcome) => info!(at_ms = step.at_ms, command = ?step.command, ?outcome, "script command"),
                Err(e) => {
                    summary.rejected += 1;
                    error!(at_ms = step.at_ms, command = ?step.command, "script command rejected: {}", e);
                }
            }
        }

        summary.polls += 1;
        if pid.compute_with(clock) {
            summary.updates += 1;
            if summary.updates % opts.log_every.max(1) == 0 {
                info!(elapsed, status = %serde_json::to_string(&pid.status())?, "pid");
            } else {
                debug!(elapsed, output = output.get(), input = input.get(), "pid update");
            }
        }

        wait();
    }

    Ok(summary)
}

fn main() -> Result<(), Box<dyn Error>>
{
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let config = load_config(&opts)?;
    let script = load_script(&opts)?;

    let input = Cell::new(opts.initial);
    let output = Cell::new(0.0);
    let setpoint = Cell::new(opts.setpoint);
    let mut pid = PidController::from_config(ProcessVars::new(&input, &output, &setpoint), &config)?;
    info!(?config, steps = script.len(), realtime = opts.realtime, "starting control loop");

    let summary = if opts.realtime {
        let poll = Duration::from_millis(u64::from(opts.poll_ms));
        run_loop(&opts, &mut pid, &input, &output, &script, &EmbassyClock, || {
            embassy_time::block_for(poll)
        })?
    } else {
        let clock = SimClock {
            now: Cell::new(opts.start_ms),
        };
        run_loop(&opts, &mut pid, &input, &output, &script, &clock, || {
            clock.now.set(clock.now.get().wrapping_add(opts.poll_ms))
        })?
    };

    info!(
        polls = summary.polls,
        updates = summary.updates,
        rejected = summary.rejected,
        peak = summary.peak,
        final_input = input.get(),
        final_output = output.get(),
        "control loop finished"
    );
    Ok(())
}
