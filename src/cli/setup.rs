//! Runtime setup: thread pools sized from `--jobs`.

/// Rayon thread stack size
const RAYON_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Configure the rayon global pool once at startup; `0` means one thread per core.
pub fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new()
        .stack_size(RAYON_STACK_SIZE)
        .thread_name(|index| format!("wsfmt-format-{}", index));

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        tracing::debug!("Thread pool already configured: {}", e);
    }
}

/// Number of worker threads to use
pub fn get_worker_count(jobs: usize) -> usize {
    if jobs == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        jobs
    }
}

/// Multi-threaded tokio runtime for the analyzer fan-out.
pub fn build_runtime(jobs: usize) -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(get_worker_count(jobs))
        .thread_name("wsfmt-worker")
        .enable_all()
        .build()
}
