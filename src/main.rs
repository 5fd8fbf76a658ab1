// main.rs - CLI entry point

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::warn;

use lingdist::cli::Config;
use lingdist::data::layout;
use lingdist::prelude::*;
use lingdist::tools::raxml;

fn main() {
    env_logger::init();
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();

    // Handle generate config first
    if args.generate_config {
        println!("{}", Config::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let threads = args.threads;
    let run_inference = args.run_inference;
    let force_recompute = args.force_recompute;
    let partitioning = args.partitioning;
    let dry_run = args.dry_run;
    let no_report = args.no_report;

    let validated = validate_args(&args)?;

    println!("🚀 lingdist v{}", env!("CARGO_PKG_VERSION"));
    println!("📐 Metrics:");
    for metric in &validated.metrics {
        println!("   - {}: {}", metric.name(), metric.description());
    }
    println!("🌳 Reference trees: {}", validated.ref_set.names().join(", "));
    if partitioning {
        println!("🧩 Partitioning variant: using the distances_partitioning subtree");
    }

    // Configure thread pool
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }

    let total_start = Instant::now();

    let table = DatasetTable::from_csv(&validated.data_path)?.filtered(&validated.filter);
    println!("✅ Dataset table loaded: {} datasets after filtering", table.len());

    if dry_run {
        for row in &table.rows {
            println!(
                "   - {} ({} sampled alignments)",
                layout::dataset_key(row),
                row.sampled_msa_paths.len()
            );
        }
        println!("✅ Dry run completed successfully");
        return Ok(());
    }

    if run_inference {
        let runner = validated
            .raxml
            .as_ref()
            .ok_or("--raxml-exe is required for the inference stage")?;
        run_inference_stage(&table, runner, &validated.results_dir);
    }

    let comparator = TreeComparator::new(validated.qdist.clone());
    let mut computed = 0usize;
    let mut cached = 0usize;
    let mut failed = 0usize;
    for row in &table.rows {
        let dist_dir = row_dist_dir(&validated, row, partitioning);
        if !force_recompute && cache_complete(&dist_dir, &validated.metrics) {
            cached += 1;
            continue;
        }
        println!("🔄 Computing distances for {}", layout::dataset_key(row));
        let sampled = sampled_tree_paths(&validated.results_dir, row);
        let refs = reference_tree_paths(&validated.results_dir, row, &validated.ref_set);
        match generate_distances(
            &dist_dir,
            &sampled,
            &refs,
            &validated.ref_set,
            &validated.metrics,
            &comparator,
        ) {
            Ok(_) => computed += 1,
            Err(e) => {
                eprintln!(
                    "⚠️  Distance computation failed for {}: {}",
                    layout::dataset_key(row),
                    e
                );
                failed += 1;
            }
        }
    }
    println!(
        "✅ Distances ready: {} computed, {} cached, {} failed",
        computed, cached, failed
    );

    if !no_report {
        write_report(&table, &validated, partitioning)?;
    }

    println!("🏁 Done in {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

fn row_dist_dir(validated: &ValidationResult, row: &DatasetRow, partitioning: bool) -> PathBuf {
    if partitioning {
        layout::dist_dir_partitioning(&validated.results_dir, row)
    } else {
        layout::dist_dir(&validated.results_dir, row)
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.is_file() {
        Some(path)
    } else {
        warn!("Tree file '{}' is missing", path.display());
        None
    }
}

/// Best-tree paths of the sampled inference runs, in sampling order.
fn sampled_tree_paths(results_dir: &Path, row: &DatasetRow) -> Vec<Option<PathBuf>> {
    (0..row.sampled_msa_paths.len())
        .map(|i| {
            let prefix = layout::run_prefix(
                results_dir,
                row,
                "raxmlng",
                &format!("sampled/sampled{}", i),
            );
            existing(raxml::best_tree_path(&prefix))
        })
        .collect()
}

/// Resolve each configured reference name to its tree file: the gold
/// standard comes from the dataset table, the consensus from the dedicated
/// consensus run, every other name from the equally named inference run.
fn reference_tree_paths(
    results_dir: &Path,
    row: &DatasetRow,
    ref_set: &ReferenceSet,
) -> Vec<Option<PathBuf>> {
    ref_set
        .names()
        .iter()
        .map(|name| {
            let path = match name.as_str() {
                "glottolog" => row.glottolog_tree_path.clone(),
                "consensus" => Some(raxml::consensus_tree_path(&layout::run_prefix(
                    results_dir,
                    row,
                    "raxmlng",
                    "sampled_consensus",
                ))),
                _ => Some(raxml::best_tree_path(&layout::run_prefix(
                    results_dir,
                    row,
                    "raxmlng",
                    name,
                ))),
            };
            path.and_then(existing)
        })
        .collect()
}

/// Infer trees for the three full codings, every sampled replicate and the
/// consensus over the replicates. Individual failures are reported and
/// skipped: a missing tree surfaces downstream as an undefined distance.
fn run_inference_stage(table: &DatasetTable, runner: &RaxmlRunner, results_dir: &Path) {
    for row in &table.rows {
        let key = layout::dataset_key(row);
        println!("🧬 Inference for {}", key);

        if let Some(msa) = &row.msa_bin {
            let prefix = layout::run_prefix(results_dir, row, "raxmlng", "bin");
            if let Err(e) = runner.run_inference(msa, "BIN+G", &prefix, &[]) {
                eprintln!("⚠️  {}: {}", key, e);
            }
        }
        if let Some(msa) = &row.msa_catg_bin {
            let prefix = layout::run_prefix(results_dir, row, "raxmlng", "catg_bin");
            if let Err(e) = runner.run_inference(msa, "BIN+G", &prefix, &["--prob-msa", "on"]) {
                eprintln!("⚠️  {}: {}", key, e);
            }
        }
        if let (Some(msa), Some(model)) = (&row.msa_catg_multi, &row.multi_model) {
            let prefix = layout::run_prefix(results_dir, row, "raxmlng", "catg_multi");
            let model = format!("{}+G", model);
            if let Err(e) = runner.run_inference(msa, &model, &prefix, &["--prob-msa", "on"]) {
                eprintln!("⚠️  {}: {}", key, e);
            }
        }

        let mut sampled_prefixes = Vec::new();
        for (i, msa) in row.sampled_msa_paths.iter().enumerate() {
            let prefix = layout::run_prefix(
                results_dir,
                row,
                "raxmlng",
                &format!("sampled/sampled{}", i),
            );
            if let Err(e) = runner.run_inference(msa, "BIN+G", &prefix, &[]) {
                eprintln!("⚠️  {}: {}", key, e);
            }
            sampled_prefixes.push(prefix);
        }
        if !sampled_prefixes.is_empty() {
            let prefix = layout::run_prefix(results_dir, row, "raxmlng", "sampled_consensus");
            if let Err(e) = runner.consense_tree(&sampled_prefixes, &prefix, &[]) {
                eprintln!("⚠️  {}: {}", key, e);
            }
        }
    }
}

/// Assemble and write the distance report. Datasets whose cache is missing
/// or structurally inconsistent are skipped with a warning; the remaining
/// rows are still reported.
fn write_report(
    table: &DatasetTable,
    validated: &ValidationResult,
    partitioning: bool,
) -> Result<(), String> {
    let mut report = DistanceReport::new(&validated.ref_set, &validated.metrics);
    for row in &table.rows {
        let key = layout::dataset_key(row);
        let dist_dir = row_dist_dir(validated, row, partitioning);
        let dm = match DistanceMatrix::from_dir(&dist_dir, &validated.metrics, validated.ref_set.clone())
        {
            Ok(dm) => dm,
            Err(e) => {
                eprintln!("⚠️  Skipping {} in report: {}", key, e);
                continue;
            }
        };
        if dm.num_sampled() != row.sampled_msa_paths.len() {
            eprintln!(
                "⚠️  Skipping {} in report: cached matrix holds {} sampled trees, dataset lists {}",
                key,
                dm.num_sampled(),
                row.sampled_msa_paths.len()
            );
            continue;
        }
        let bin_prefix = layout::run_prefix(&validated.results_dir, row, "raxmlng", "bin");
        let alpha = raxml::alpha(&bin_prefix);
        let avg_ml_dist = raxml::avg_ml_tree_dist(&bin_prefix);
        let zero_base_frequency = raxml::base_frequencies(&bin_prefix).first().copied();
        report.add_row(row, &dm, alpha, avg_ml_dist, zero_base_frequency)?;
    }
    report.write(&validated.report_path)?;
    println!(
        "📊 Report with {} rows written to: {}",
        report.len(),
        validated.report_path.display()
    );
    Ok(())
}
