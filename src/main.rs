use clap::Parser;
use colored::*;

use gaze_trainer::args::TrainArgs;
use gaze_trainer::config::TrainConfig;
use gaze_trainer::trainer::{self, select_device};

fn main() -> anyhow::Result<()> {
    gaze_trainer::init_tracing();
    let args = TrainArgs::parse();

    // 0. Load Config
    let config = args.apply(TrainConfig::load(&args.config)?);

    // 1. Pick Device
    let device = select_device(args.cpu);
    println!("{}", format!("Device: {:?}", device).green());

    // 2. Train, evaluate, save
    let report = trainer::run(&config, device)?;

    if let Some(best) = report.history.best_epoch {
        println!("Best epoch: {}", best);
    }
    Ok(())
}
