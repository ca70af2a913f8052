use envsync::cli;
use envsync::error::EnvsyncError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let result = cli::parse_args(std::env::args_os()).and_then(|cli| {
        init_tracing(cli.verbose());
        cli::execute(cli)
    });

    if let Err(err) = result {
        match err {
            EnvsyncError::Usage(usage) => eprint!("{usage}"),
            err => eprintln!("error: {err}"),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ENVSYNC_LOG").unwrap_or_else(|_| {
        if verbose { EnvFilter::new("envsync=debug") } else { EnvFilter::new("envsync=warn") }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .try_init();
}
