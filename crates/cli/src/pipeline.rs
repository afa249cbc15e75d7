//! `foodshare run` / `foodshare validate`: config-driven cleaning pipeline.

use std::path::{Path, PathBuf};

use log::info;

use foodshare_clean::config::ResolvedPaths;
use foodshare_clean::{PipelineConfig, RunSummary, Table};

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

fn load_config(config_path: &Path) -> Result<(PipelineConfig, ResolvedPaths), CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", config_path.display())))?;
    let config = PipelineConfig::from_toml(&config_str).map_err(CliError::clean)?;

    // Relative paths resolve against the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let paths = config.resolve_paths(base_dir);
    Ok((config, paths))
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, output_file: Option<PathBuf>) -> Result<(), CliError> {
    let (config, paths) = load_config(&config_path)?;
    let vocab = config.vocabularies().map_err(CliError::clean)?;

    let raw = foodshare_io::csv::read_dataset(&paths).map_err(CliError::file)?;
    let dataset = foodshare_clean::run(&raw, &vocab).map_err(CliError::clean)?;
    if !dataset.is_reconciled() {
        return Err(CliError {
            code: EXIT_ERROR,
            message: "row counts do not reconcile (input != accepted + rejected)".into(),
            hint: None,
        });
    }

    // Store before artifacts; a failed load writes no cleaned CSVs.
    let counts = foodshare_store::load(&dataset, &paths.database).map_err(CliError::store)?;
    let written = foodshare_io::write_outputs(&dataset, &paths).map_err(CliError::file)?;

    let mut summary = RunSummary::new(&config.name, &dataset);
    let summary_path =
        foodshare_io::write_run_summary(&mut summary, &written, &paths).map_err(CliError::file)?;
    info!("run summary written to {}", summary_path.display());

    let json_str = serde_json::to_string_pretty(&summary)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, format!("{json_str}\n"))
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!("{}: {} rows rejected", config.name, summary.total_rejected());
    for table in &summary.tables {
        eprintln!(
            "  {:<14} {:>6} in  {:>6} accepted  {:>6} rejected",
            table.table, table.input_rows, table.accepted, table.rejected,
        );
        for (artifact, count) in &table.rejects {
            eprintln!("    {artifact}: {count}");
        }
    }
    if summary.backfilled_locations > 0 {
        eprintln!("  backfilled {} listing locations from provider city", summary.backfilled_locations);
    }
    eprintln!(
        "store: {} ({} providers, {} receivers, {} listings, {} claims)",
        paths.database.display(),
        counts.providers,
        counts.receivers,
        counts.food_listings,
        counts.claims,
    );

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, paths) = load_config(&config_path)?;

    for table in Table::ALL {
        let path = &paths.inputs[&table];
        let raw = foodshare_io::csv::read_table(table, path).map_err(CliError::file)?;
        raw.require_columns().map_err(CliError::clean)?;
        eprintln!("  {:<14} {} ({} rows)", table.name(), path.display(), raw.rows.len());
    }

    eprintln!("config ok: {}", config.name);
    eprintln!("  output:   {}", paths.output_dir.display());
    eprintln!("  rejects:  {}", paths.rejects_dir.display());
    eprintln!("  database: {}", paths.database.display());
    Ok(())
}
