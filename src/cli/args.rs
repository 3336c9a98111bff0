use clap::Parser;

use crate::config::defs::FASTQ_EXTS;

/// Accepts a read-file path only if its suffix marks it as FASTQ.
fn fastq_path(value: &str) -> Result<String, String> {
    let lower = value.to_ascii_lowercase();
    if FASTQ_EXTS.iter().any(|ext| lower.ends_with(&format!(".{}", ext))) {
        Ok(value.to_string())
    } else {
        Err("only .fastq or .fq input files allowed".to_string())
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "fastastic",
    version,
    about = "Assembles and annotates prokaryotic genome reads with SPAdes, FastQC, QUAST and Prokka"
)]
pub struct Arguments {
    #[arg(short = 'i', long = "fq1", value_parser = fastq_path, help = "Primary FASTQ read file")]
    pub fq1: String,

    #[arg(short = 'I', long = "fq2", value_parser = fastq_path, help = "Second FASTQ read file for paired-end libraries")]
    pub fq2: Option<String>,

    #[arg(long = "spades", default_value = "./spades.py", help = "Path to spades.py")]
    pub spades_path: String,

    #[arg(long = "fastqc", default_value = "fastqc", help = "Path to the FastQC executable")]
    pub fastqc_path: String,

    #[arg(long = "quast", default_value = "./quast.py", help = "Path to quast.py")]
    pub quast_path: String,

    #[arg(long = "prokka", default_value = "./prokka", help = "Path to the Prokka executable")]
    pub prokka_path: String,

    #[arg(short = 'o', long = "out", help = "Output directory for all generated files. If not specified, a directory named 'FASTASTIC' is created in the current working directory.")]
    pub out_dir: Option<String>,

    #[arg(long = "skip-db-setup", help = "Do not run 'prokka --setupdb' before annotating")]
    pub skip_db_setup: bool,

    #[arg(short = 'v', long = "verbose", action, help = "Also log the output of external commands that succeed")]
    pub verbose: bool,
}
