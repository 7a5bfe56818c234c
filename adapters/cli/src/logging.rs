use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs the global logger for a run.
///
/// `--verbose` lowers the default filter to `debug`; `RUST_LOG` still wins.
pub(crate) fn init(verbose: bool) {
    let default = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default.as_str()));
    let _ = builder.format_timestamp_millis();
    // A logger installed earlier in the process keeps precedence.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init(true);
        init(false);
        log::debug!("logger survives a second install");
    }
}
