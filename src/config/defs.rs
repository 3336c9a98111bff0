use crate::cli::Arguments;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

// External software
pub const SPADES_TAG: &str = "spades.py";
pub const FASTQC_TAG: &str = "fastqc";
pub const QUAST_TAG: &str = "quast.py";
pub const PROKKA_TAG: &str = "prokka";
pub const PROKKA_SETUPDB_TAG: &str = "prokka --setupdb";
pub const RENAME_TAG: &str = "rename_contigs";

lazy_static! {
    pub static ref VERSION_FLAGS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(SPADES_TAG, "--version");
        m.insert(FASTQC_TAG, "-v");
        m.insert(QUAST_TAG, "--version");
        m.insert(PROKKA_TAG, "--version");

        m
    };
}

// Workspace layout
pub const WORKSPACE_DIR: &str = "FASTASTIC";
pub const SPADES_DIR: &str = "SPAdes";
pub const FASTQC_DIR: &str = "FastQC";
pub const QUAST_DIR: &str = "QUAST";
pub const PROKKA_DIR: &str = "Prokka";
pub const STAGE_DIRS: &[&str] = &[SPADES_DIR, FASTQC_DIR, QUAST_DIR, PROKKA_DIR];

// Static filenames
pub const CONTIGS_FASTA: &str = "contigs.fasta";
pub const CONTIGS_SHORT_FASTA: &str = "contigs_short.fasta";
pub const NAME_MAP_FILE: &str = "name_map.txt";

// Static parameters

// Prokka rejects contig identifiers longer than this.
pub const MAX_CONTIG_ID_LEN: usize = 20;

pub const FASTQ_EXTS: &[&str] = &["fastq", "fq"];

pub struct RunConfig {
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub fq1_path: PathBuf,
    pub fq2_path: Option<PathBuf>,
    pub args: Arguments,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not create workspace directory {}: {source}", .path.display())]
    Workspace { path: PathBuf, source: io::Error },
    #[error("contig rename on {} failed: {source}", .path.display())]
    Rename { path: PathBuf, source: io::Error },
    #[error("{} has sequence data before the first header (line {line})", .path.display())]
    LeadingSequence { path: PathBuf, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "ok"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: String,
    pub outcome: Outcome,
}

/// Per-stage outcomes in execution order, reported once at the end of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<StageOutcome>,
}

impl RunSummary {
    pub fn record(&mut self, stage: &str, outcome: Outcome) {
        self.outcomes.push(StageOutcome {
            stage: stage.to_string(),
            outcome,
        });
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.outcome == Outcome::Success)
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Failed)
            .count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<22}{}", "stage", "status")?;
        for o in &self.outcomes {
            writeln!(f, "{:<22}{}", o.stage, o.outcome)?;
        }
        Ok(())
    }
}
