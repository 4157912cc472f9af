use cronsh::shell::Shell;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CRONSH_LOG";

fn main() -> Result<(), cronsh::error::ShellError> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut shell = Shell::new()?;
    shell.run()
}
