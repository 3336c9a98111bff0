use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{LevelFilter, error, info};

use fastastic::cli::parse;
use fastastic::config::defs::{RunConfig, WORKSPACE_DIR};
use fastastic::pipelines::assembly_annotation;
use fastastic::utils::file::absolutize;

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n FASTASTIC\n-------------\n");

    let cwd = std::env::current_dir()?;
    info!("The current directory is {:?}\n", cwd);

    let fq1_path = absolutize(Path::new(&args.fq1), &cwd);
    let fq2_path = args.fq2.as_ref().map(|f| absolutize(Path::new(f), &cwd));
    let out_dir = match &args.out_dir {
        Some(out) => absolutize(Path::new(out), &cwd),
        None => cwd.join(WORKSPACE_DIR),
    };

    let config = Arc::new(RunConfig {
        cwd,
        out_dir,
        fq1_path,
        fq2_path,
        args,
    });

    let summary = match assembly_annotation::run(config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(
                "Pipeline failed: {} at {} milliseconds.",
                e,
                run_start.elapsed().as_millis()
            );
            std::process::exit(1);
        }
    };

    println!("{}", summary);
    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());

    if summary.failed() > 0 {
        info!("{} stage(s) failed; see diagnostics above.", summary.failed());
        std::process::exit(2);
    }
    Ok(())
}
