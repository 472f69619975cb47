//! Microphone capture.
//!
//! This module selects the input device, negotiates a stream configuration and
//! forwards captured audio as 16kHz mono chunks over a channel.

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, SupportedStreamConfig};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use tokio::sync::mpsc::UnboundedSender;

pub const SAMPLE_RATE: u32 = 16_000;

#[derive(Clone, Copy)]
struct Resample {
    samplerate_in: u32,
    in_channels: u16,
}

fn audio_resample(data: &[f32], sample_rate0: u32, sample_rate: u32, channels: u16) -> Vec<f32> {
    use samplerate::{ConverterType, convert};
    convert(
        sample_rate0 as _,
        sample_rate as _,
        channels as _,
        ConverterType::SincBestQuality,
        data,
    )
    .unwrap_or_default()
}

fn to_mono(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels == 1 {
        return samples;
    }
    let n = channels as usize;
    samples
        .chunks(n)
        .map(|chunk| chunk.iter().sum::<f32>() / n as f32)
        .collect()
}

pub struct Capture {
    device: cpal::Device,
    stream_config: SupportedStreamConfig,
}

impl Capture {
    /// Finds the input device. `Ok(None)` means the host has no microphone at all.
    pub fn new(device_name: Option<&str>) -> Result<Option<Self>> {
        let host = cpal::default_host();
        debug!("Default host: {:?}", host.id());

        let device = if let Some(device_name) = device_name {
            let names: HashSet<_> = host.input_devices()?.flat_map(|d| d.name()).collect();
            debug!("Available input devices: {names:?}");
            host.input_devices()?
                .find(|d| d.name().map(|name| name == device_name).unwrap_or(false))
                .ok_or_else(|| {
                    anyhow!(
                        "Requested audio device '{}' not found, available: {:?}",
                        device_name,
                        names
                    )
                })?
        } else {
            match host.default_input_device() {
                Some(device) => device,
                None => {
                    warn!("No default input device found");
                    return Ok(None);
                }
            }
        };

        info!("Using input device: {}", device.name()?);

        // Prefer 16kHz f32, otherwise take whatever the device offers and resample.
        let wanted = SampleRate(SAMPLE_RATE);
        let exact = device.supported_input_configs().ok().and_then(|mut configs| {
            configs.find_map(|range| {
                (range.min_sample_rate() <= wanted
                    && range.max_sample_rate() >= wanted
                    && range.sample_format() == cpal::SampleFormat::F32)
                    .then(|| range.with_sample_rate(wanted))
            })
        });
        let stream_config = match exact {
            Some(config) => config,
            None => {
                debug!("Could not find supported configs");
                device
                    .default_input_config()
                    .context("No usable input configuration")?
            }
        };
        if stream_config.sample_format() != cpal::SampleFormat::F32 {
            return Err(anyhow!(
                "Unsupported sample format {:?}",
                stream_config.sample_format()
            ));
        }
        debug!("Using stream config: {:?}", stream_config);

        Ok(Some(Self {
            device,
            stream_config,
        }))
    }

    /// Opens a playing input stream. Audio flows until the stream is dropped.
    pub fn open(&self, tx: UnboundedSender<Vec<f32>>) -> Result<cpal::Stream> {
        let resampler = if self.stream_config.sample_rate().0 != SAMPLE_RATE
            || self.stream_config.channels() != 1
        {
            Some(Resample {
                samplerate_in: self.stream_config.sample_rate().0,
                in_channels: self.stream_config.channels(),
            })
        } else {
            None
        };
        let err_fn = move |err| {
            error!("Audio stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.stream_config.clone().into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let chunk = match resampler {
                        Some(r) => to_mono(
                            audio_resample(data, r.samplerate_in, SAMPLE_RATE, r.in_channels),
                            r.in_channels,
                        ),
                        None => data.to_vec(),
                    };
                    // The receiver is gone once the utterance is complete.
                    let _ = tx.send(chunk);
                },
                err_fn,
                None,
            )
            .context("Failed to create audio stream")?;
        stream.play().context("Cannot start audio stream")?;
        Ok(stream)
    }
}
