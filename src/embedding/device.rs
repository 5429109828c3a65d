use candle_core::Device;
use tracing::{debug, info, warn};

use super::error::EmbeddingError;

/// Picks the first GPU backend compiled in (Metal, then CUDA) and falls back to CPU.
///
/// Never fails today; the `Result` keeps GPU-only deployments able to refuse a CPU fallback.
pub fn select_device() -> Result<Device, EmbeddingError> {
    let mut failures: Vec<String> = Vec::new();

    for (name, attempt) in gpu_backends() {
        match attempt() {
            Ok(device) => {
                info!(backend = name, "Using GPU acceleration for model inference");
                return Ok(device);
            }
            Err(e) => {
                warn!(backend = name, error = %e, "GPU backend unavailable");
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        debug!("No GPU backend compiled, using CPU");
    } else {
        warn!(reason = %failures.join("; "), "Falling back to CPU device");
    }
    Ok(Device::Cpu)
}

type DeviceCtor = fn() -> candle_core::Result<Device>;

#[allow(clippy::vec_init_then_push, unused_mut)]
fn gpu_backends() -> Vec<(&'static str, DeviceCtor)> {
    let mut backends: Vec<(&'static str, DeviceCtor)> = Vec::new();
    #[cfg(feature = "metal")]
    backends.push(("metal", || Device::new_metal(0)));
    #[cfg(feature = "cuda")]
    backends.push(("cuda", || Device::new_cuda(0)));
    backends
}
