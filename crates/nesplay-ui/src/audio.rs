use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample, SupportedBufferSize};
use log::{error, info};
use nesplay_core::audio::{AudioCallback, AudioSink, OutputFormat};
use thiserror::Error;

/// Samples converted per batch inside the device callback.
const SCRATCH_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("no supported output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("audio output was already attached")]
    AlreadyAttached,
}

/// The largest buffer the device accepts, capped at one second of audio.
///
/// A larger device buffer trades latency for immunity to frame-time jitter on
/// the producer side.
pub fn high_latency_buffer(sample_rate: u32, supported: &SupportedBufferSize) -> cpal::BufferSize {
    match *supported {
        SupportedBufferSize::Range { min, max } => {
            cpal::BufferSize::Fixed(max.min(sample_rate).max(min))
        }
        SupportedBufferSize::Unknown => cpal::BufferSize::Default,
    }
}

/// Open the default output device and start pulling from `sink`.
///
/// The returned stream must be kept alive for playback to continue.
pub fn start_stream(sink: &mut AudioSink) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();

    let mut config: cpal::StreamConfig = supported.config();
    config.buffer_size = high_latency_buffer(config.sample_rate.0, supported.buffer_size());

    let format = OutputFormat {
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };
    let callback = sink
        .attach_output(format)
        .ok_or(AudioError::AlreadyAttached)?;

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build::<f32>(&device, &config, callback)?,
        cpal::SampleFormat::I16 => build::<i16>(&device, &config, callback)?,
        cpal::SampleFormat::U16 => build::<u16>(&device, &config, callback)?,
        other => return Err(AudioError::UnsupportedFormat(other)),
    };
    stream.play()?;

    info!(
        "Audio output: {} Hz, {} channels, {sample_format}, buffer {:?}",
        format.sample_rate, format.channels, config.buffer_size
    );
    Ok(stream)
}

fn build<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: AudioCallback,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    // Batches stay a whole number of frames so channel groups line up.
    let channels = callback.channels();
    let batch = (SCRATCH_LEN / channels).max(1) * channels;
    let mut scratch = [0.0f32; SCRATCH_LEN];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for chunk in data.chunks_mut(batch) {
                let samples = &mut scratch[..chunk.len()];
                callback.pull_block(samples);
                for (dst, &src) in chunk.iter_mut().zip(samples.iter()) {
                    *dst = T::from_sample(src);
                }
            }
        },
        |err| error!("cpal stream error: {err}"),
        None,
    )?;
    Ok(stream)
}
