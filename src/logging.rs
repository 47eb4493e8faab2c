/// Installs `env_logger` as the global logger, filtered by `RUST_LOG`.
///
/// Safe to call more than once; a logger that is already installed is kept.
pub fn init_logging() {
    if let Err(e) = env_logger::try_init() {
        log::warn!("Could not initialize logger: {}", e);
    }
}
