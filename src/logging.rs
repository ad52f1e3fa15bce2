use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber for the overlay logs.
///
/// With `debug` enabled the level defaults to `debug` and can be overridden through `RUST_LOG`.
/// Otherwise `info` is forced, regardless of `RUST_LOG`. Calling this more than once, or after
/// another subscriber was installed, has no effect.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
