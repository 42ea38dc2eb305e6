use std::cell::{Cell, UnsafeCell};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of mono samples in one second of audio at 44.1 kHz.
pub const ONE_SECOND_AT_44100: usize = 44_100;

/// Producer half of a single-producer / single-consumer ring of mono samples.
///
/// Intended for the emulation thread feeding the audio callback thread
/// without locks. The queue is *lossy* when full: new pushes are dropped and
/// the samples already queued are kept.
///
/// The producer is neither `Clone` nor `Sync`, so only one thread can push.
pub struct SampleProducer {
    inner: Arc<Inner>,
    _not_sync: PhantomData<Cell<()>>,
}

/// Consumer half of the sample ring. Popping requires `&mut self`.
pub struct SampleConsumer {
    inner: Arc<Inner>,
}

struct Inner {
    // One extra slot so head==tail is unambiguously empty.
    buf: Box<[UnsafeCell<f32>]>,
    cap: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// Safe because:
// - Only the producer writes to `buf[head]`.
// - Only the consumer reads from `buf[tail]`.
// - All coordination happens through atomics.
unsafe impl Sync for Inner {}

impl Inner {
    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail {
            head - tail
        } else {
            (self.cap - tail) + head
        }
    }

    fn capacity(&self) -> usize {
        self.cap - 1
    }

    #[inline]
    fn next_index(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.cap { 0 } else { next }
    }
}

/// Create a sample ring holding at most `capacity` samples (at least one).
pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let cap = capacity.max(1) + 1;
    let buf: Vec<UnsafeCell<f32>> = (0..cap).map(|_| UnsafeCell::new(0.0)).collect();

    let inner = Arc::new(Inner {
        buf: buf.into_boxed_slice(),
        cap,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });

    (
        SampleProducer {
            inner: Arc::clone(&inner),
            _not_sync: PhantomData,
        },
        SampleConsumer { inner },
    )
}

impl SampleProducer {
    /// Queue a sample. Returns `false` (and drops the sample) when full.
    #[inline]
    pub fn push(&self, sample: f32) -> bool {
        let head = self.inner.head.load(Ordering::Relaxed);
        let next = self.inner.next_index(head);
        let tail = self.inner.tail.load(Ordering::Acquire);
        if next == tail {
            // Full: drop newest.
            return false;
        }

        unsafe {
            *self.inner.buf[head].get() = sample;
        }
        self.inner.head.store(next, Ordering::Release);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl SampleConsumer {
    /// Pop the oldest sample without blocking.
    #[inline]
    pub fn pop(&mut self) -> Option<f32> {
        let tail = self.inner.tail.load(Ordering::Relaxed);
        let head = self.inner.head.load(Ordering::Acquire);
        if tail == head {
            return None;
        }

        let sample = unsafe { *self.inner.buf[tail].get() };
        let next = self.inner.next_index(tail);
        self.inner.tail.store(next, Ordering::Release);
        Some(sample)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}
