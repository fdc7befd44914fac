use anyhow::bail;
use clap::Parser;

use gaze_trainer::args::PreviewArgs;
use gaze_trainer::database::CaptureDatabase;
use gaze_trainer::output::PreviewWindow;
use gaze_trainer::preview::{random_samples, render_sheet, save_sheet};

fn main() -> anyhow::Result<()> {
    gaze_trainer::init_tracing();
    let args = PreviewArgs::parse();

    let db = CaptureDatabase::open(&args.db_path)?;
    let samples = random_samples(&db, args.num_samples)?;
    if samples.is_empty() {
        bail!("No gaze samples found in {}", args.db_path.display());
    }
    for s in &samples {
        tracing::debug!(rowid = s.rowid, theta1 = s.angles.theta1, theta2 = s.angles.theta2, "preview sample");
    }

    let sheet = render_sheet(&samples);
    match &args.save {
        Some(path) => {
            save_sheet(&sheet, path)?;
            println!("Preview written to {}", path.display());
        }
        None => {
            println!("Close the window or press Escape to exit...");
            let mut window = PreviewWindow::new("Gaze Dataset Preview", sheet.width() as usize, sheet.height() as usize)?;
            window.run(&sheet)?;
        }
    }
    Ok(())
}
