//! Render queue and worker pool.
//!
//! The owner thread enqueues every tile of a cycle, posts one work permit per
//! tile and then blocks until the same number of tiles has come back. Workers
//! pop tiles from a mutex-guarded list, rasterize them with private scratch
//! memory and hand the tile pixels back; the owner copies them into the back
//! raster buffer and flips it once the cycle is complete.

mod pixel_pool;
mod worker;

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use model::{ScreenRect, TileMask, TilePos};
use renderer::{RasterBufferError, RasterBuffers, RenderScene, TileScratch, rasterize_tile};
use tracing::{debug, error, info};

use pixel_pool::PixelPool;

/// Signature of the per-tile rasterizer run by the workers.
pub(crate) type RasterizeFn = fn(&RenderScene, ScreenRect, u32, &mut TileScratch, &mut Vec<u8>);

pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        * 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueConfig {
    pub worker_count: usize,
}

impl Default for RenderQueueConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderQueueError {
    ZeroWorkers,
    Spawn { worker_index: usize },
    /// Every worker is gone; no tile can complete.
    WorkersDisconnected,
    Buffer(RasterBufferError),
}

impl fmt::Display for RenderQueueError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderQueueError::ZeroWorkers => {
                write!(formatter, "render queue needs at least one worker")
            }
            RenderQueueError::Spawn { worker_index } => {
                write!(formatter, "failed to spawn render worker {worker_index}")
            }
            RenderQueueError::WorkersDisconnected => {
                write!(formatter, "render workers disconnected")
            }
            RenderQueueError::Buffer(error) => write!(formatter, "{error}"),
        }
    }
}

impl std::error::Error for RenderQueueError {}

impl From<RasterBufferError> for RenderQueueError {
    fn from(error: RasterBufferError) -> Self {
        Self::Buffer(error)
    }
}

/// One tile of work. Owns the pixel buffer the worker writes into.
#[derive(Debug)]
pub struct TileJob {
    pub tile: TilePos,
    pub rect: ScreenRect,
    pub block_width: u32,
    pub scene: Arc<RenderScene>,
    pixels: Vec<u8>,
}

/// A finished tile: tile-local RGBA8 rows, `rect.width() * 4` bytes each.
#[derive(Debug)]
pub struct TileOutput {
    pub tile: TilePos,
    pub rect: ScreenRect,
    pub pixels: Vec<u8>,
    /// The rasterizer panicked; `pixels` holds the scene background.
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderCycleReport {
    pub tiles_rendered: usize,
    pub tiles_failed: usize,
    pub flipped: bool,
}

pub(crate) struct SharedQueue {
    // Held only to push or pop; never while rasterizing.
    pending: Mutex<VecDeque<TileJob>>,
    rasterize: RasterizeFn,
}

impl SharedQueue {
    pub(crate) fn pop(&self) -> Option<TileJob> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

pub struct RenderQueue {
    shared: Arc<SharedQueue>,
    // `None` only while dropping.
    work_sender: Option<Sender<()>>,
    completion_receiver: Receiver<TileOutput>,
    workers: Vec<JoinHandle<()>>,
    pixel_pool: PixelPool,
    outstanding: usize,
}

impl RenderQueue {
    pub fn start(config: RenderQueueConfig) -> Result<Self, RenderQueueError> {
        Self::start_with_rasterizer(config, rasterize_tile)
    }

    pub(crate) fn start_with_rasterizer(
        config: RenderQueueConfig,
        rasterize: RasterizeFn,
    ) -> Result<Self, RenderQueueError> {
        if config.worker_count == 0 {
            return Err(RenderQueueError::ZeroWorkers);
        }
        let shared = Arc::new(SharedQueue {
            pending: Mutex::new(VecDeque::new()),
            rasterize,
        });
        let (work_sender, work_receiver) = unbounded::<()>();
        let (completion_sender, completion_receiver) = unbounded::<TileOutput>();

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_index in 0..config.worker_count {
            let shared = Arc::clone(&shared);
            let work_receiver = work_receiver.clone();
            let completion_sender = completion_sender.clone();
            let handle = std::thread::Builder::new()
                .name(format!("render_worker_{worker_index}"))
                .spawn(move || {
                    worker::worker_loop(worker_index, shared, work_receiver, completion_sender)
                })
                .map_err(|spawn_error| {
                    error!(worker_index, %spawn_error, "failed to spawn render worker");
                    RenderQueueError::Spawn { worker_index }
                })?;
            workers.push(handle);
        }
        info!(worker_count = config.worker_count, "render queue started");

        Ok(Self {
            shared,
            work_sender: Some(work_sender),
            completion_receiver,
            workers,
            pixel_pool: PixelPool::default(),
            outstanding: 0,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tiles enqueued but not yet collected by [`RenderQueue::wait_for_completion`].
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn enqueue(
        &mut self,
        tile: TilePos,
        rect: ScreenRect,
        block_width: u32,
        scene: &Arc<RenderScene>,
    ) -> Result<(), RenderQueueError> {
        let job = TileJob {
            tile,
            rect,
            block_width,
            scene: Arc::clone(scene),
            pixels: self.pixel_pool.take(),
        };
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(job);
        let work_sender = self
            .work_sender
            .as_ref()
            .ok_or(RenderQueueError::WorkersDisconnected)?;
        work_sender
            .send(())
            .map_err(|_| RenderQueueError::WorkersDisconnected)?;
        self.outstanding += 1;
        Ok(())
    }

    /// Completion barrier: blocks until every enqueued tile has come back.
    ///
    /// `on_tile` sees each finished tile once, in completion order. Returns the
    /// number of tiles whose rasterization failed.
    pub fn wait_for_completion(
        &mut self,
        mut on_tile: impl FnMut(&TileOutput),
    ) -> Result<usize, RenderQueueError> {
        let mut failed = 0;
        while self.outstanding > 0 {
            let output = self
                .completion_receiver
                .recv()
                .map_err(|_| RenderQueueError::WorkersDisconnected)?;
            self.outstanding -= 1;
            failed += output.failed as usize;
            on_tile(&output);
            self.pixel_pool.give_back(output.pixels);
        }
        Ok(failed)
    }

    /// Renders the tiles in `mask` into the back buffer of `buffers`, then flips.
    ///
    /// Without a full redraw the back buffer is first seeded with the active
    /// image so unmarked tiles keep their previous pixels. An empty mask renders
    /// nothing and does not flip.
    pub fn render(
        &mut self,
        scene: Arc<RenderScene>,
        mask: &TileMask,
        full_redraw: bool,
        buffers: &mut RasterBuffers,
    ) -> Result<RenderCycleReport, RenderQueueError> {
        if mask.is_empty() {
            return Ok(RenderCycleReport::default());
        }
        if !full_redraw {
            buffers.copy_active_to_back();
        }

        let block_width = mask.layout().block_width();
        for (tile, rect) in mask.iter_marked() {
            self.enqueue(tile, rect, block_width, &scene)?;
        }
        let tiles_rendered = self.outstanding;

        let mut blit_error = None;
        let tiles_failed = self.wait_for_completion(|output| {
            if let Err(error) = buffers.write_tile(output.rect, &output.pixels) {
                blit_error.get_or_insert(error);
            }
        })?;
        // Barrier passed: no worker holds a tile buffer any more.
        self.pixel_pool.reset();
        if let Some(error) = blit_error {
            return Err(error.into());
        }

        buffers.flip();
        debug!(
            tiles_rendered,
            tiles_failed,
            active_index = buffers.active_index(),
            "render cycle complete"
        );
        Ok(RenderCycleReport {
            tiles_rendered,
            tiles_failed,
            flipped: true,
        })
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        // Disconnecting the work signal lets idle workers fall out of their loop.
        self.work_sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("render worker panicked outside tile rasterization");
            }
        }
        debug!("render queue stopped");
    }
}

#[cfg(test)]
mod tests;
