use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use model::BYTES_PER_PIXEL;
use renderer::TileScratch;
use tracing::{debug, error};

use crate::{SharedQueue, TileJob, TileOutput};

pub(crate) fn worker_loop(
    worker_index: usize,
    shared: Arc<SharedQueue>,
    work_receiver: Receiver<()>,
    completion_sender: Sender<TileOutput>,
) {
    let mut scratch = TileScratch::new();
    debug!(worker_index, "render worker started");
    while work_receiver.recv().is_ok() {
        // A permit without a tile is a spurious wakeup.
        let Some(job) = shared.pop() else {
            continue;
        };
        let output = run_job(worker_index, &shared, job, &mut scratch);
        if completion_sender.send(output).is_err() {
            break;
        }
    }
    debug!(worker_index, "render worker exiting");
}

fn run_job(
    worker_index: usize,
    shared: &SharedQueue,
    job: TileJob,
    scratch: &mut TileScratch,
) -> TileOutput {
    let TileJob {
        tile,
        rect,
        block_width,
        scene,
        mut pixels,
    } = job;

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        (shared.rasterize)(&scene, rect, block_width, scratch, &mut pixels)
    }));
    let failed = match result {
        Ok(()) => false,
        Err(payload) => {
            error!(
                worker_index,
                tile_x = tile.x,
                tile_y = tile.y,
                reason = panic_message(payload.as_ref()),
                "tile rasterization panicked; delivering background tile"
            );
            *scratch = TileScratch::new();
            true
        }
    };

    // A failed or short tile still blits cleanly, as plain background.
    let expected_len = rect.area() * BYTES_PER_PIXEL;
    if failed || pixels.len() != expected_len {
        fill_background(&mut pixels, expected_len, scene.background.to_rgba8());
    }

    TileOutput {
        tile,
        rect,
        pixels,
        failed,
    }
}

fn fill_background(pixels: &mut Vec<u8>, len: usize, background: [u8; 4]) {
    pixels.clear();
    pixels.resize(len, 0);
    for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        pixel.copy_from_slice(&background);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
