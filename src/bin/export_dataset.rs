use clap::Parser;

use gaze_trainer::args::ExportArgs;
use gaze_trainer::export::export_dataset;

fn main() -> anyhow::Result<()> {
    gaze_trainer::init_tracing();
    let args = ExportArgs::parse();

    println!("Exporting datasets from SQLite DB to folders with images and CSV labels.");
    export_dataset(&args.db_path, &args.output_dir, args.image_size(), args.clear)?;
    Ok(())
}
