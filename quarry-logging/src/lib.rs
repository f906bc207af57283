use quarry_core::err::Result;
pub use log::*;

/// Configures the process-wide logger, honouring `RUST_LOG` and
/// defaulting to `info`
pub fn init_logging() -> Result<()> {
    env_logger::try_init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    )?;
    Ok(())
}

/// Logging init function for tests
pub fn init_for_tests() {
    let res = env_logger::builder()
        .filter_module("quarry", LevelFilter::Trace)
        .is_test(true)
        .try_init();
    if let Err(err) = res {
        eprintln!("Failed to init logging: {}", err);
    }
}
