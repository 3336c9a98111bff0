//! Stage construction, per-tool command-line argument generation, and
//! subprocess execution for the external analysis tools.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Result, anyhow};
use log::{debug, warn};
use tokio::process::Command;

use crate::config::defs::VERSION_FLAGS;

/// One external invocation, assembled just in time from the run configuration
/// and the declared outputs of earlier stages.
#[derive(Debug, Clone)]
pub struct Stage {
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, OsString)>,
    pub inputs: Vec<PathBuf>,
}

impl Stage {
    pub fn new(tool: &str, program: &Path) -> Self {
        Self {
            tool: tool.to_string(),
            program: program.to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Appends an argument list produced by one of the tool submodules.
    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Adds a variable to the child's environment, replacing any inherited
    /// value of the same name. Unrelated variables are passed through.
    pub fn env(mut self, key: &str, value: OsString) -> Self {
        self.env.push((key.to_string(), value));
        self
    }

    /// Declares an artifact this stage reads. Missing inputs are logged, not
    /// enforced: the tool's own exit status reports the failure.
    pub fn input(mut self, path: PathBuf) -> Self {
        self.inputs.push(path);
        self
    }
}

/// Outcome of one stage invocation. A non-zero exit or an unlaunchable
/// program both land here as data; neither is a Rust error.
#[derive(Debug)]
pub struct StageResult {
    pub tool: String,
    pub success: bool,
    pub output: String,
}

/// Runs a stage to completion and captures stdout and stderr as one text.
///
/// # Arguments
///
/// * `stage` - The assembled stage description.
///
/// # Returns
/// StageResult
pub async fn run_stage(stage: &Stage) -> StageResult {
    for input in &stage.inputs {
        if !input.exists() {
            warn!(
                "{}: expected input {} does not exist",
                stage.tool,
                input.display()
            );
        }
    }
    debug!("{} args: {:?}", stage.tool, stage.args);

    let mut cmd = Command::new(&stage.program);
    cmd.args(&stage.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &stage.env {
        cmd.env(key, value);
    }

    match cmd.output().await {
        Ok(output) => {
            let success = output.status.success();
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            if !success {
                text.push_str(&format!("\n{}: {}", stage.tool, output.status));
            }
            StageResult {
                tool: stage.tool.clone(),
                success,
                output: text,
            }
        }
        Err(e) => StageResult {
            tool: stage.tool.clone(),
            success: false,
            output: format!(
                "Failed to spawn {}: {}. Is {} installed?",
                stage.program.display(),
                e,
                stage.tool
            ),
        },
    }
}

pub mod spades {
    use std::path::Path;

    use crate::config::defs::RunConfig;

    pub fn arg_generator(config: &RunConfig, out_dir: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("--s1".to_string());
        args_vec.push(config.fq1_path.to_string_lossy().to_string());
        if let Some(fq2) = &config.fq2_path {
            args_vec.push("--s2".to_string());
            args_vec.push(fq2.to_string_lossy().to_string());
        }
        args_vec.push("-o".to_string());
        args_vec.push(out_dir.to_string_lossy().to_string());
        args_vec
    }
}

pub mod fastqc {
    use std::path::Path;

    use crate::config::defs::RunConfig;

    pub fn arg_generator(config: &RunConfig, out_dir: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push(config.fq1_path.to_string_lossy().to_string());
        if let Some(fq2) = &config.fq2_path {
            args_vec.push(fq2.to_string_lossy().to_string());
        }
        args_vec.push(format!("--outdir={}", out_dir.to_string_lossy()));
        args_vec
    }
}

pub mod quast {
    use std::path::Path;

    pub fn arg_generator(contigs: &Path, out_dir: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push(contigs.to_string_lossy().to_string());
        args_vec.push("-o".to_string());
        args_vec.push(out_dir.to_string_lossy().to_string());
        args_vec
    }
}

pub mod prokka {
    use std::env;
    use std::ffi::OsString;
    use std::path::Path;

    pub fn setupdb_args() -> Vec<String> {
        vec!["--setupdb".to_string()]
    }

    pub fn arg_generator(contigs_short: &Path, out_dir: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("--outdir".to_string());
        args_vec.push(out_dir.to_string_lossy().to_string());
        args_vec.push("--force".to_string());
        args_vec.push(contigs_short.to_string_lossy().to_string());
        args_vec
    }

    /// PATH with the directory holding the Prokka executable prepended, so
    /// its co-located support binaries resolve inside the child process.
    pub fn path_env(prokka_path: &Path) -> (String, OsString) {
        let dir = prokka_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut paths = vec![dir.to_path_buf()];
        if let Some(existing) = env::var_os("PATH") {
            paths.extend(env::split_paths(&existing));
        }
        let joined = env::join_paths(paths).unwrap_or_else(|_| dir.as_os_str().to_os_string());
        ("PATH".to_string(), joined)
    }
}

/// Asks one tool for its version string.
pub async fn check_version(tool: &str, program: &Path) -> Result<String> {
    let flag = VERSION_FLAGS
        .get(tool)
        .ok_or_else(|| anyhow!("Unknown tool: {}", tool))?;

    let output = Command::new(program)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            anyhow!(
                "Failed to spawn {}: {}. Is {} installed?",
                program.display(),
                e,
                tool
            )
        })?;

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    let first_line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| anyhow!("No output from {} {}", tool, flag))?;
    Ok(first_line.trim().to_string())
}

/// Reports each tool's version, or a warning when one cannot be reached.
/// Presence problems never stop the run; the affected stage fails on its own.
pub async fn check_versions(tools: &[(&str, &Path)]) {
    for (tool, program) in tools {
        match check_version(tool, program).await {
            Ok(version) => debug!("{}: {}", tool, version),
            Err(e) => warn!("{}", e),
        }
    }
}
