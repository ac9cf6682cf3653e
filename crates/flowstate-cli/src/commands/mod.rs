pub mod api;
pub mod config;
pub mod run;
pub mod theme;
pub mod tracks;

/// Single-threaded runtime for the async commands; the engine and its
/// signal loop never need more than one worker.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
