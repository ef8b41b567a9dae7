//! Command line host: load a document, edit it through the row tree, and
//! print the resulting layout table.

use anyhow::Context;
use clap::Parser;
use propgrid::statics;
use propgrid::{Document, Role, TreeConfig, TreeController, TreeError, Value};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "propgrid",
    about = "Lay out a JSON5 document as a property grid and apply edits"
)]
struct Args {
    /// JSON5 document, optionally gzip-compressed.
    path: PathBuf,

    /// Available width in pixels.
    #[arg(long, default_value_t = 480)]
    width: i32,

    /// Expand newly created rows up to this depth.
    #[arg(long)]
    expand_levels: Option<usize>,

    /// JSON5 file with tree and style settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Compact mode: no indentation or toggles for first-level rows.
    #[arg(long)]
    compact: bool,

    /// Pack long runs of checkboxes into columns.
    #[arg(long)]
    pack: bool,

    /// Edit a leaf, e.g. `--set player.speed=7.5`. Repeatable.
    #[arg(long = "set", value_name = "PATH=JSON5")]
    sets: Vec<String>,

    /// Write the edited document here (`.gz` for gzip).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "propgrid=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => TreeConfig::load_path(path)?,
        None => TreeConfig::default(),
    };
    if let Some(levels) = args.expand_levels {
        config.auto_expand_levels = levels;
    }
    config.style.compact |= args.compact;
    config.style.pack_checkboxes |= args.pack;

    let mut document = Document::load_path(&args.path)?;
    let mut controller = TreeController::new(config);
    let report = controller.revert(&document.root);
    for err in &report.errors {
        tracing::warn!(%err, "document traversal problem");
    }
    tracing::info!(
        rows = report.created,
        exemplars = report.exemplars_built,
        "document loaded into row tree"
    );

    if !args.sets.is_empty() {
        for assignment in &args.sets {
            apply_assignment(&mut controller, assignment)?;
        }
        let mut root = document.root.clone();
        controller.apply(&mut root)?;
        document.set_root(root);
    }

    if let Some(output) = &args.output {
        document.save_to_path(output)?;
        tracing::info!(path = %output.display(), "document written");
    }

    print_layout(&mut controller, args.width);
    Ok(())
}

fn apply_assignment(controller: &mut TreeController, assignment: &str) -> anyhow::Result<()> {
    let (path, text) = assignment
        .split_once('=')
        .with_context(|| format!("{}: {assignment:?}", statics::EN_ERR_BAD_SET))?;
    let value = Value::parse_json5(text).with_context(|| format!("value of {path}"))?;
    let names: Vec<&str> = path.split('.').collect();
    let row = controller
        .find_path(&names)
        .ok_or_else(|| TreeError::UnknownPath(path.to_string()))?;
    controller.set_value(row, value)?;
    Ok(())
}

fn print_layout(controller: &mut TreeController, width: i32) {
    controller.layout(width);
    let layout = controller.cached_layout();
    let tree = controller.tree();

    println!(
        "{:>5}  {:<10}  {:<32}  {}",
        statics::EN_COL_ELEMENT,
        statics::EN_COL_ROLE,
        statics::EN_COL_ROW,
        statics::EN_COL_RECT
    );
    for (i, e) in layout.elements().iter().enumerate() {
        let row = match e.row {
            Some(id) => tree.path_of(id),
            None if e.role == Role::Root => statics::EN_LITERAL_ROOT.to_string(),
            None => "-".to_string(),
        };
        let r = e.rect;
        println!(
            "{i:>5}  {:<10}  {row:<32}  {},{} {}x{}",
            e.role.name(),
            r.x,
            r.y,
            r.width,
            r.height
        );
    }
}
