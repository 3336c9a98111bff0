use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info};

use crate::config::defs::{
    CONTIGS_FASTA, FASTQC_DIR, FASTQC_TAG, NAME_MAP_FILE, Outcome, PROKKA_DIR, PROKKA_SETUPDB_TAG,
    PROKKA_TAG, PipelineError, QUAST_DIR, QUAST_TAG, RENAME_TAG, RunConfig, RunSummary, SPADES_DIR,
    SPADES_TAG,
};
use crate::utils::command::{self, Stage, StageResult, run_stage};
use crate::utils::fasta::{rename_contigs, write_name_map};
use crate::utils::file::absolutize;
use crate::utils::workspace::ensure_layout;

/// Drives the fixed assembly-and-annotation sequence: SPAdes, FastQC, QUAST,
/// contig rename, Prokka DB setup, Prokka.
///
/// Stage failures are reported and recorded but never abort the run; later
/// stages get their attempt even when an earlier artifact is missing. The
/// one fatal condition is a workspace that cannot be created.
///
/// # Arguments
///
/// * `config` - RunConfig struct from main.
///
/// # Returns
/// Result<RunSummary, PipelineError>
pub async fn run(config: Arc<RunConfig>) -> Result<RunSummary, PipelineError> {
    ensure_layout(&config.out_dir)?;

    let prokka_program = absolutize(Path::new(&config.args.prokka_path), &config.cwd);

    // External tools check
    command::check_versions(&[
        (SPADES_TAG, Path::new(&config.args.spades_path)),
        (FASTQC_TAG, Path::new(&config.args.fastqc_path)),
        (QUAST_TAG, Path::new(&config.args.quast_path)),
        (PROKKA_TAG, &prokka_program),
    ])
    .await;

    let mut summary = RunSummary::default();

    let spades_out = config.out_dir.join(SPADES_DIR);
    info!("Running SPAdes...");
    let mut stage = Stage::new(SPADES_TAG, Path::new(&config.args.spades_path))
        .args(command::spades::arg_generator(&config, &spades_out))
        .input(config.fq1_path.clone());
    if let Some(fq2) = &config.fq2_path {
        stage = stage.input(fq2.clone());
    }
    report(&config, &mut summary, run_stage(&stage).await);

    info!("Running FastQC...");
    let mut stage = Stage::new(FASTQC_TAG, Path::new(&config.args.fastqc_path))
        .args(command::fastqc::arg_generator(
            &config,
            &config.out_dir.join(FASTQC_DIR),
        ))
        .input(config.fq1_path.clone());
    if let Some(fq2) = &config.fq2_path {
        stage = stage.input(fq2.clone());
    }
    report(&config, &mut summary, run_stage(&stage).await);

    let contigs = spades_out.join(CONTIGS_FASTA);
    info!("Running QUAST...");
    let stage = Stage::new(QUAST_TAG, Path::new(&config.args.quast_path))
        .args(command::quast::arg_generator(
            &contigs,
            &config.out_dir.join(QUAST_DIR),
        ))
        .input(contigs.clone());
    report(&config, &mut summary, run_stage(&stage).await);

    // Prokka caps contig identifier length, so the assembler's headers are
    // swapped for short synthetic ones before annotation.
    info!("Renaming headers in {}...", contigs.display());
    let renamed_contigs = match rename_contigs(&contigs) {
        Ok((new_contig_file, name_map)) => {
            let map_path = spades_out.join(NAME_MAP_FILE);
            match write_name_map(&map_path, &name_map) {
                Ok(()) => {
                    info!(
                        "Renamed {} contig headers; map written to {}",
                        name_map.len(),
                        map_path.display()
                    );
                    summary.record(RENAME_TAG, Outcome::Success);
                    Some(new_contig_file)
                }
                Err(e) => {
                    error!("{}", e);
                    summary.record(RENAME_TAG, Outcome::Failed);
                    None
                }
            }
        }
        Err(e) => {
            error!("{}", e);
            summary.record(RENAME_TAG, Outcome::Failed);
            None
        }
    };

    let (path_key, path_value) = command::prokka::path_env(&prokka_program);
    debug!("New $PATH is: {:?}", path_value);

    if config.args.skip_db_setup {
        info!("Skipping Prokka DB setup");
        summary.record(PROKKA_SETUPDB_TAG, Outcome::Skipped);
    } else {
        info!("Setting up Prokka DB...");
        let stage = Stage::new(PROKKA_SETUPDB_TAG, &prokka_program)
            .args(command::prokka::setupdb_args())
            .env(&path_key, path_value.clone());
        report(&config, &mut summary, run_stage(&stage).await);
    }

    match renamed_contigs {
        Some(contigs_short) => {
            info!("Running Prokka...");
            let stage = Stage::new(PROKKA_TAG, &prokka_program)
                .args(command::prokka::arg_generator(
                    &contigs_short,
                    &config.out_dir.join(PROKKA_DIR),
                ))
                .env(&path_key, path_value)
                .input(contigs_short.clone());
            report(&config, &mut summary, run_stage(&stage).await);
        }
        None => {
            info!("Skipping Prokka: no renamed contig file to annotate");
            summary.record(PROKKA_TAG, Outcome::Skipped);
        }
    }

    Ok(summary)
}

/// Applies the uniform failure policy to one stage result: log and continue.
fn report(config: &RunConfig, summary: &mut RunSummary, result: StageResult) {
    if result.success {
        if config.args.verbose && !result.output.is_empty() {
            info!("{} output:\n{}", result.tool, result.output);
        }
        summary.record(&result.tool, Outcome::Success);
    } else {
        error!("An error occurred while trying to run {}", result.tool);
        error!("See error output below:\n{}", result.output);
        summary.record(&result.tool, Outcome::Failed);
    }
}
