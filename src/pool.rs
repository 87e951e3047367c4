//! Size-classed buffer pool (component A).
//!
//! The pool amortizes the cost of growing `i32`/`f64`/`u8` columns by keeping a
//! free list per power-of-two size class. `acquire` never zeroes the returned
//! buffer — callers must not read past the length they themselves write.
//! `release` is idempotent: releasing a buffer after process teardown has
//! begun is simply a leak, which is an accepted tradeoff of a static pool.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Round a requested capacity up to its size class (next power of two, with a
/// floor of 16 elements to avoid thrashing on tiny columns).
fn size_class(min_capacity: usize) -> usize {
    min_capacity.max(16).next_power_of_two()
}

/// A free-list keyed by size class for a single element type.
struct TypedPool<T> {
    free: HashMap<usize, Vec<Vec<T>>>,
}

impl<T> TypedPool<T> {
    fn new() -> Self {
        Self { free: HashMap::new() }
    }

    fn acquire(&mut self, min_capacity: usize) -> Vec<T> {
        let class = size_class(min_capacity);
        if let Some(bucket) = self.free.get_mut(&class) {
            if let Some(buf) = bucket.pop() {
                return buf;
            }
        }
        Vec::with_capacity(class)
    }

    fn release(&mut self, mut buf: Vec<T>) {
        buf.clear();
        let class = size_class(buf.capacity());
        self.free.entry(class).or_default().push(buf);
    }
}

/// Process-wide, lock-synchronized buffer pool for the three hot element
/// types. Each call site acquires/releases through the single static handle
/// returned by [`pool`].
pub struct BufferPool {
    i32_pool: Mutex<TypedPool<i32>>,
    f64_pool: Mutex<TypedPool<f64>>,
    u8_pool: Mutex<TypedPool<u8>>,
}

impl BufferPool {
    fn new() -> Self {
        Self {
            i32_pool: Mutex::new(TypedPool::new()),
            f64_pool: Mutex::new(TypedPool::new()),
            u8_pool: Mutex::new(TypedPool::new()),
        }
    }

    /// Acquire an `i32` buffer with capacity at least `min_capacity`.
    pub fn acquire_i32(&self, min_capacity: usize) -> Vec<i32> {
        self.i32_pool.lock().acquire(min_capacity)
    }

    /// Return an `i32` buffer to the pool.
    pub fn release_i32(&self, buf: Vec<i32>) {
        self.i32_pool.lock().release(buf)
    }

    /// Acquire an `f64` buffer with capacity at least `min_capacity`.
    pub fn acquire_f64(&self, min_capacity: usize) -> Vec<f64> {
        self.f64_pool.lock().acquire(min_capacity)
    }

    /// Return an `f64` buffer to the pool.
    pub fn release_f64(&self, buf: Vec<f64>) {
        self.f64_pool.lock().release(buf)
    }

    /// Acquire a `u8` buffer (validity masks, boolean columns, string byte
    /// buffers) with capacity at least `min_capacity`.
    pub fn acquire_u8(&self, min_capacity: usize) -> Vec<u8> {
        self.u8_pool.lock().acquire(min_capacity)
    }

    /// Return a `u8` buffer to the pool.
    pub fn release_u8(&self, buf: Vec<u8>) {
        self.u8_pool.lock().release(buf)
    }
}

static POOL: std::sync::OnceLock<BufferPool> = std::sync::OnceLock::new();

/// The process-wide pool handle. Initialized lazily on first use; there is no
/// explicit `init` — pool state is process-scoped for the lifetime of the
/// program.
pub fn pool() -> &'static BufferPool {
    POOL.get_or_init(BufferPool::new)
}

/// `new_cap = max(2 * old_cap, requested)`, the growth policy every growable
/// column buffer uses.
pub fn grow_capacity(old_cap: usize, requested: usize) -> usize {
    (old_cap * 2).max(requested)
}
