use anyhow::Result;
use avatar_config::ProfileCatalog;

pub fn run() -> Result<()> {
    println!(
        "{:<18} {:>6} {:>6} {:>9} {:>9} {:>11} {:>10} {:>7}",
        "PROFILE", "WIDTH", "BUFS", "LATENCY", "BACKPRESS", "MEMORY", "JITTER", "RETRY"
    );

    for spec in ProfileCatalog::all() {
        let buffers = spec.buffer_profile();
        println!(
            "{:<18} {:>6} {:>6} {:>7.0}ms {:>9} {:>11} {:>10} {:>7}",
            spec.name.as_str(),
            spec.output_width_px,
            format!("{}/{}", spec.buffers.input_depth, spec.buffers.output_depth),
            buffers.approx_latency_ms,
            buffers.backpressure.to_string(),
            buffers.memory.to_string(),
            buffers.jitter_tolerance.to_string(),
            format!("{}x{}s", spec.retry.max_attempts, spec.retry.interval_seconds),
        );
    }

    Ok(())
}
