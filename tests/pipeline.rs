use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;

use fastastic::cli::Arguments;
use fastastic::config::defs::{
    CONTIGS_SHORT_FASTA, FASTQC_DIR, FASTQC_TAG, NAME_MAP_FILE, Outcome, PROKKA_DIR,
    PROKKA_SETUPDB_TAG, PROKKA_TAG, PipelineError, QUAST_DIR, QUAST_TAG, RENAME_TAG, RunConfig,
    RunSummary, SPADES_DIR, SPADES_TAG,
};
use fastastic::pipelines::assembly_annotation;

/// Drops a small shell script into `dir` so the pipeline has something to
/// invoke in place of the real tool.
fn fake_tool(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms)?;
    Ok(path)
}

/// A spades.py stand-in that records its arguments and writes a two-contig
/// assembly into the requested output directory.
const FAKE_SPADES: &str = r#"echo "$@" > "$(dirname "$0")/spades_args.txt"
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
if [ -z "$out" ]; then exit 1; fi
printf '>NODE_1_length_4_cov_2.000000\nACGT\n>NODE_2_length_4_cov_1.500000\nTTTT\n' > "$out/contigs.fasta"
"#;

const FAKE_FASTQC: &str = r#"echo "$@" > "$(dirname "$0")/fastqc_args.txt""#;

/// Fails exactly like QUAST does when the contigs file never materialized.
const FAKE_QUAST: &str = r#"echo "$@" > "$(dirname "$0")/quast_args.txt"
if [ ! -f "$1" ]; then echo "contigs file missing" 1>&2; exit 1; fi
"#;

const FAKE_PROKKA: &str = r#"echo "$@" >> "$(dirname "$0")/prokka_args.txt"
printenv PATH > "$(dirname "$0")/prokka_path.txt"
"#;

fn run_config(tmp: &Path, bin: &Path, paired: bool, skip_db_setup: bool) -> Arc<RunConfig> {
    let fq1_path = tmp.join("reads_R1.fastq");
    fs::write(&fq1_path, "@r1\nACGT\n+\nIIII\n").unwrap();
    let fq2_path = if paired {
        let path = tmp.join("reads_R2.fastq");
        fs::write(&path, "@r2\nTTTT\n+\nIIII\n").unwrap();
        Some(path)
    } else {
        None
    };

    let args = Arguments {
        fq1: fq1_path.to_string_lossy().to_string(),
        fq2: fq2_path.as_ref().map(|p| p.to_string_lossy().to_string()),
        spades_path: bin.join("spades.py").to_string_lossy().to_string(),
        fastqc_path: bin.join("fastqc").to_string_lossy().to_string(),
        quast_path: bin.join("quast.py").to_string_lossy().to_string(),
        prokka_path: bin.join("prokka").to_string_lossy().to_string(),
        out_dir: None,
        skip_db_setup,
        verbose: false,
    };

    Arc::new(RunConfig {
        cwd: tmp.to_path_buf(),
        out_dir: tmp.join("FASTASTIC"),
        fq1_path,
        fq2_path,
        args,
    })
}

fn outcome_of(summary: &RunSummary, stage: &str) -> Outcome {
    summary
        .outcomes()
        .iter()
        .find(|o| o.stage == stage)
        .unwrap_or_else(|| panic!("no outcome recorded for {}", stage))
        .outcome
}

#[tokio::test]
async fn paired_end_run_produces_full_artifact_tree() -> Result<()> {
    let tmp = tempdir()?;
    let bin = tmp.path().join("bin");
    fs::create_dir(&bin)?;
    fake_tool(&bin, "spades.py", FAKE_SPADES)?;
    fake_tool(&bin, "fastqc", FAKE_FASTQC)?;
    fake_tool(&bin, "quast.py", FAKE_QUAST)?;
    fake_tool(&bin, "prokka", FAKE_PROKKA)?;

    let config = run_config(tmp.path(), &bin, true, false);
    let summary = assembly_annotation::run(config.clone()).await?;

    assert!(summary.all_succeeded(), "summary: {}", summary);

    for dir in [SPADES_DIR, FASTQC_DIR, QUAST_DIR, PROKKA_DIR] {
        assert!(config.out_dir.join(dir).is_dir(), "missing {}", dir);
    }

    let spades_out = config.out_dir.join(SPADES_DIR);
    assert_eq!(
        fs::read_to_string(spades_out.join(CONTIGS_SHORT_FASTA))?,
        ">contig0\nACGT\n>contig1\nTTTT\n"
    );
    assert_eq!(
        fs::read_to_string(spades_out.join(NAME_MAP_FILE))?,
        "new,old\ncontig0,NODE_1_length_4_cov_2.000000\ncontig1,NODE_2_length_4_cov_1.500000\n"
    );

    let spades_args = fs::read_to_string(bin.join("spades_args.txt"))?;
    assert!(spades_args.contains("--s1"));
    assert!(spades_args.contains("--s2"));

    let fastqc_args = fs::read_to_string(bin.join("fastqc_args.txt"))?;
    assert!(fastqc_args.contains("reads_R1.fastq"));
    assert!(fastqc_args.contains("reads_R2.fastq"));

    let quast_args = fs::read_to_string(bin.join("quast_args.txt"))?;
    assert!(quast_args.contains("contigs.fasta"));

    let prokka_args = fs::read_to_string(bin.join("prokka_args.txt"))?;
    assert!(prokka_args.contains("--setupdb"));
    assert!(prokka_args.contains("--force"));
    assert!(prokka_args.contains(CONTIGS_SHORT_FASTA));

    // The annotation stages see their own directory at the front of PATH.
    let prokka_path = fs::read_to_string(bin.join("prokka_path.txt"))?;
    assert!(prokka_path.starts_with(&format!("{}:", bin.display())));

    Ok(())
}

#[tokio::test]
async fn single_end_run_omits_second_read_everywhere() -> Result<()> {
    let tmp = tempdir()?;
    let bin = tmp.path().join("bin");
    fs::create_dir(&bin)?;
    fake_tool(&bin, "spades.py", FAKE_SPADES)?;
    fake_tool(&bin, "fastqc", FAKE_FASTQC)?;
    fake_tool(&bin, "quast.py", FAKE_QUAST)?;
    fake_tool(&bin, "prokka", FAKE_PROKKA)?;

    let config = run_config(tmp.path(), &bin, false, false);
    let summary = assembly_annotation::run(config).await?;

    assert!(summary.all_succeeded(), "summary: {}", summary);

    let spades_args = fs::read_to_string(bin.join("spades_args.txt"))?;
    assert!(!spades_args.contains("--s2"));

    let fastqc_args = fs::read_to_string(bin.join("fastqc_args.txt"))?;
    assert!(!fastqc_args.contains("reads_R2.fastq"));

    Ok(())
}

#[tokio::test]
async fn failed_assembly_does_not_stop_the_pipeline() -> Result<()> {
    let tmp = tempdir()?;
    let bin = tmp.path().join("bin");
    fs::create_dir(&bin)?;
    fake_tool(&bin, "spades.py", "exit 1")?;
    fake_tool(&bin, "fastqc", FAKE_FASTQC)?;
    fake_tool(&bin, "quast.py", FAKE_QUAST)?;
    fake_tool(&bin, "prokka", FAKE_PROKKA)?;

    let config = run_config(tmp.path(), &bin, true, false);
    let summary = assembly_annotation::run(config).await?;

    assert_eq!(outcome_of(&summary, SPADES_TAG), Outcome::Failed);
    assert_eq!(outcome_of(&summary, FASTQC_TAG), Outcome::Success);
    assert_eq!(outcome_of(&summary, QUAST_TAG), Outcome::Failed);
    assert_eq!(outcome_of(&summary, RENAME_TAG), Outcome::Failed);
    assert_eq!(outcome_of(&summary, PROKKA_SETUPDB_TAG), Outcome::Success);
    assert_eq!(outcome_of(&summary, PROKKA_TAG), Outcome::Skipped);
    assert_eq!(summary.failed(), 3);

    Ok(())
}

#[tokio::test]
async fn skip_db_setup_is_not_a_failure() -> Result<()> {
    let tmp = tempdir()?;
    let bin = tmp.path().join("bin");
    fs::create_dir(&bin)?;
    fake_tool(&bin, "spades.py", FAKE_SPADES)?;
    fake_tool(&bin, "fastqc", FAKE_FASTQC)?;
    fake_tool(&bin, "quast.py", FAKE_QUAST)?;
    fake_tool(&bin, "prokka", FAKE_PROKKA)?;

    let config = run_config(tmp.path(), &bin, true, true);
    let summary = assembly_annotation::run(config).await?;

    assert_eq!(outcome_of(&summary, PROKKA_SETUPDB_TAG), Outcome::Skipped);
    assert_eq!(outcome_of(&summary, PROKKA_TAG), Outcome::Success);
    assert_eq!(summary.failed(), 0);

    let prokka_args = fs::read_to_string(bin.join("prokka_args.txt"))?;
    assert!(!prokka_args.contains("--setupdb"));

    Ok(())
}

#[tokio::test]
async fn unusable_workspace_aborts_the_run() -> Result<()> {
    let tmp = tempdir()?;
    let bin = tmp.path().join("bin");
    fs::create_dir(&bin)?;
    // Occupy the workspace root with a plain file.
    fs::write(tmp.path().join("FASTASTIC"), b"in the way")?;

    let config = run_config(tmp.path(), &bin, false, false);
    let err = assembly_annotation::run(config).await.unwrap_err();
    assert!(matches!(err, PipelineError::Workspace { .. }));

    Ok(())
}
