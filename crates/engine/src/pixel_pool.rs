/// Tile pixel buffers recycled across cycles.
///
/// Buffers leave the pool with a job and come back with its output. `reset`
/// ends the cycle after the completion barrier, once no worker can hold one:
/// it checks that every buffer is back and trims the free list.
#[derive(Debug, Default)]
pub(crate) struct PixelPool {
    free: Vec<Vec<u8>>,
    lent: usize,
}

// Enough for a few full-screen cycles of 512 px tiles at 4K.
const MAX_RETAINED: usize = 256;

impl PixelPool {
    pub(crate) fn take(&mut self) -> Vec<u8> {
        self.lent += 1;
        self.free.pop().unwrap_or_default()
    }

    pub(crate) fn give_back(&mut self, mut pixels: Vec<u8>) {
        self.lent = self.lent.saturating_sub(1);
        pixels.clear();
        self.free.push(pixels);
    }

    pub(crate) fn reset(&mut self) {
        assert_eq!(
            self.lent, 0,
            "pixel pool reset with {} buffers still lent",
            self.lent
        );
        self.free.truncate(MAX_RETAINED);
    }

    #[cfg(test)]
    pub(crate) fn retained(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returned_buffers_are_reused_empty() {
        let mut pool = PixelPool::default();
        let mut pixels = pool.take();
        pixels.extend_from_slice(&[1, 2, 3, 4]);
        let capacity = pixels.capacity();
        pool.give_back(pixels);
        assert_eq!(pool.retained(), 1);

        let reused = pool.take();
        assert!(reused.is_empty());
        assert_eq!(reused.capacity(), capacity);
        pool.give_back(reused);
        pool.reset();
    }

    #[test]
    fn reset_trims_the_free_list_after_a_large_cycle() {
        let mut pool = PixelPool::default();
        let lent: Vec<_> = (0..MAX_RETAINED + 10).map(|_| pool.take()).collect();
        for pixels in lent {
            pool.give_back(pixels);
        }
        assert_eq!(pool.retained(), MAX_RETAINED + 10);

        pool.reset();
        assert_eq!(pool.retained(), MAX_RETAINED);
    }

    #[test]
    #[should_panic(expected = "still lent")]
    fn reset_with_a_buffer_outstanding_panics() {
        let mut pool = PixelPool::default();
        let _pixels = pool.take();
        pool.reset();
    }
}
