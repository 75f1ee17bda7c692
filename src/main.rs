// src/main.rs

use taskshim::errors::ShimError;
use taskshim::{cli, logging, run};

/// Exit status for problems of the shim's own setup.
const CONFIG_EXIT: i32 = 2;

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("taskshim error: {err:?}");
            exit_status(&err)
        }
    };
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

fn exit_status(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ShimError>() {
        Some(
            ShimError::ConfigError(_)
            | ShimError::TomlError(_)
            | ShimError::IoError(_)
            | ShimError::UnsupportedSource(_),
        ) => CONFIG_EXIT,
        _ => 1,
    }
}
