//! `moonquake build` command

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};

use moonquake::engine::types::Architecture;
use moonquake::ops::{build, BuildOptions};

use crate::cli::BuildArgs;

pub fn execute(args: BuildArgs) -> Result<()> {
    let architecture = args
        .arch
        .as_deref()
        .map(|s| s.parse::<Architecture>())
        .transpose()
        .map_err(|e| anyhow!("invalid architecture: {e}"))?;

    let options = BuildOptions {
        directory: args.directory,
        root: args.root,
        configuration: args.config,
        architecture,
        emit_plan: args.emit_plan,
        write_headers: !args.skip_headers,
    };

    if args.rebuild {
        tracing::debug!("rebuild requested; every build is a full build");
    }

    let outcome = build(&args.input, &options)?;

    println!(
        "Resolved root '{}' for {} ({} resolutions total).",
        outcome.root_name,
        outcome.chosen,
        outcome.resolutions.len()
    );

    // The bar draws on stderr; the per-unit lines stay on stdout so they
    // survive redirection.
    let total_units: u64 = outcome
        .ordered_modules
        .iter()
        .map(|m| m.translation_units.len() as u64)
        .sum();
    let bar = ProgressBar::new(total_units.max(1));
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for module in &outcome.ordered_modules {
        println!("[moonquake] Building module '{}'...", module.name);
        let count = module.translation_units.len();
        for (i, unit) in module.translation_units.iter().enumerate() {
            let file = unit
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| unit.display().to_string());
            println!("[{} of {count}] {file}", i + 1);
            bar.inc(1);
        }
    }
    bar.finish_and_clear();

    let chosen_root = &outcome.resolutions[&outcome.chosen];
    match chosen_root.main_module() {
        Some(main) => println!("Main module: {}", main.name),
        None => println!("No main module (library-only root)."),
    }
    println!(
        "Build order: {}",
        outcome
            .ordered_modules
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    if !outcome.emitted_headers.is_empty() {
        println!(
            "Emitted {} definitions header(s).",
            outcome.emitted_headers.len()
        );
    }

    Ok(())
}
