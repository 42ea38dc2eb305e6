use crate::audio_queue::{ONE_SECOND_AT_44100, SampleConsumer, SampleProducer, sample_queue};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Device configuration obtained from hardware negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Volume scalar shared between the UI thread and the audio callback.
///
/// Stored as the bit pattern of an `f32`. Writes use release ordering, the
/// callback reads with relaxed ordering.
#[derive(Debug)]
pub struct AudioVolume(AtomicU32);

impl AudioVolume {
    pub fn new(volume: f32) -> Self {
        Self(AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()))
    }

    pub fn set(&self, volume: f32) {
        self.0
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl Default for AudioVolume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Emulation-side handle used by a console to queue samples.
///
/// Clones share the same producer and stay on the presentation thread.
#[derive(Clone)]
pub struct SampleSender {
    producer: Rc<SampleProducer>,
    sample_rate: u32,
}

impl SampleSender {
    /// Queue one mono sample; dropped if the queue is full.
    #[inline]
    pub fn push(&self, sample: f32) -> bool {
        self.producer.push(sample)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Bridge between the variable-rate emulation producer and the fixed-rate
/// hardware consumer.
///
/// The sink owns the producer half of a one-second sample ring and the shared
/// volume scalar. The consumer half is handed out once, as an
/// [`AudioCallback`], when the device format has been negotiated.
pub struct AudioSink {
    producer: Rc<SampleProducer>,
    consumer: Option<SampleConsumer>,
    // Sized to one second of the negotiated rate unless set explicitly.
    fixed_capacity: bool,
    volume: Arc<AudioVolume>,
    format: Option<OutputFormat>,
}

impl AudioSink {
    /// Sink holding one second of audio. The ring starts at 44.1 kHz and is
    /// resized to the device rate when the output is attached.
    pub fn new() -> Self {
        Self {
            fixed_capacity: false,
            ..Self::with_capacity(ONE_SECOND_AT_44100)
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (producer, consumer) = sample_queue(capacity);
        Self {
            producer: Rc::new(producer),
            consumer: Some(consumer),
            fixed_capacity: true,
            volume: Arc::new(AudioVolume::default()),
            format: None,
        }
    }

    /// Queue a sample from the producer context. Never blocks; a full queue
    /// drops the sample and returns `false`.
    #[inline]
    pub fn push(&self, sample: f32) -> bool {
        self.producer.push(sample)
    }

    /// Store a new volume scalar. Applies to the next pulled sample.
    pub fn set_volume(&self, volume: f32) {
        self.volume.set(volume);
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    pub fn volume_handle(&self) -> Arc<AudioVolume> {
        Arc::clone(&self.volume)
    }

    /// Record the negotiated device format and hand out the consumer side.
    ///
    /// Returns `None` if the consumer was already taken.
    pub fn attach_output(&mut self, format: OutputFormat) -> Option<AudioCallback> {
        let mut consumer = self.consumer.take()?;
        let one_second = format.sample_rate.max(1) as usize;
        if !self.fixed_capacity && self.producer.capacity() != one_second {
            let (producer, fresh) = sample_queue(one_second);
            self.producer = Rc::new(producer);
            consumer = fresh;
        }
        self.format = Some(format);
        Some(AudioCallback {
            consumer,
            volume: Arc::clone(&self.volume),
            channels: usize::from(format.channels.max(1)),
        })
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.format.map(|f| f.sample_rate)
    }

    /// Producer handle for a console, available once the device is open.
    pub fn sender(&self) -> Option<SampleSender> {
        let sample_rate = self.sample_rate()?;
        Some(SampleSender {
            producer: Rc::clone(&self.producer),
            sample_rate,
        })
    }

    pub fn queued(&self) -> usize {
        self.producer.len()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity()
    }
}

impl Default for AudioSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of the [`AudioSink`], driven by the hardware callback.
pub struct AudioCallback {
    consumer: SampleConsumer,
    volume: Arc<AudioVolume>,
    channels: usize,
}

impl AudioCallback {
    /// Fill an interleaved output block.
    ///
    /// One sample is popped at the start of each channel group and fanned out
    /// to every channel of that frame. An empty queue yields silence. Never
    /// blocks, allocates or logs.
    #[inline]
    pub fn pull_block(&mut self, out: &mut [f32]) {
        let mut current = 0.0;
        for (i, slot) in out.iter_mut().enumerate() {
            if i % self.channels == 0 {
                current = self.consumer.pop().unwrap_or(0.0);
            }
            *slot = current * self.volume.get();
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}
