mod app;
mod layout;
mod lens;
mod snapshot;
mod store;
mod util;
mod view;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::layout::DEFAULT_CHARGE;
use crate::store::{DirectorySource, SnapshotStore, closest_architecture};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding `<arch>.json` and `<arch><step>.json` snapshots.
    #[arg(long, default_value = "json")]
    snapshot_dir: String,

    #[arg(long, default_value = "migration")]
    architecture: String,

    #[arg(long, default_value_t = 0)]
    step: usize,

    /// Node charge; negative values repel.
    #[arg(long, default_value_t = DEFAULT_CHARGE, allow_hyphen_values = true)]
    charge: f32,
}

fn init_tracing() -> Result<()> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let source = DirectorySource::new(&args.snapshot_dir);
    let architectures = source.architectures()?;
    let architecture = match closest_architecture(&architectures, &args.architecture) {
        Some(name) if name == args.architecture => name.to_owned(),
        Some(name) => {
            warn!(requested = %args.architecture, resolved = name, "using closest architecture");
            name.to_owned()
        }
        None => bail!(
            "no snapshots for architecture `{}` in {}",
            args.architecture,
            args.snapshot_dir
        ),
    };
    info!(%architecture, step = args.step, charge = args.charge, "starting viewer");

    let store = SnapshotStore::new(source, args.charge);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "simianviz",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ViewerApp::new(
                cc,
                store,
                architectures,
                architecture,
                args.step,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited: {error}"))
}
