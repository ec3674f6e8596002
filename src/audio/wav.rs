//! WAV audio file processing

use crate::error::{NormkitError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::{s, Array2, ArrayView1};
use std::fs::File;
use std::path::Path;

/// On-disk sample encoding, preserved across load and save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    Int16,
    Float32,
}

impl SampleEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleEncoding::Int16 => 16,
            SampleEncoding::Float32 => 32,
        }
    }

    fn sample_format(&self) -> SampleFormat {
        match self {
            SampleEncoding::Int16 => SampleFormat::Int,
            SampleEncoding::Float32 => SampleFormat::Float,
        }
    }
}

/// A loaded sound: frames by channels, samples normalized to [-1, 1].
#[derive(Debug, Clone)]
pub struct Sound {
    frames: Array2<f32>,
    sample_rate: u32,
    encoding: SampleEncoding,
}

impl Sound {
    pub fn new(frames: Array2<f32>, sample_rate: u32, encoding: SampleEncoding) -> Result<Self> {
        if sample_rate == 0 {
            return Err(NormkitError::audio("Sample rate cannot be 0"));
        }
        if frames.ncols() == 0 {
            return Err(NormkitError::audio("Sound must have at least one channel"));
        }
        Ok(Sound {
            frames,
            sample_rate,
            encoding,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            NormkitError::audio(format!("Cannot open audio file {}: {e}", path.display()))
        })?;
        let mut reader = WavReader::new(file)
            .map_err(|e| NormkitError::audio(format!("Cannot read {}: {e}", path.display())))?;

        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(NormkitError::audio("Invalid sample rate"));
        }
        if spec.channels == 0 {
            return Err(NormkitError::audio("Invalid channel count"));
        }

        let (samples, encoding): (Vec<f32>, SampleEncoding) =
            match (spec.sample_format, spec.bits_per_sample) {
                (SampleFormat::Int, 16) => {
                    let read: std::result::Result<Vec<i16>, _> =
                        reader.samples::<i16>().collect();
                    let read = read
                        .map_err(|e| NormkitError::audio(format!("Failed to read sample: {e}")))?;
                    (
                        read.into_iter().map(|v| f32::from(v) / 32767.0).collect(),
                        SampleEncoding::Int16,
                    )
                }
                (SampleFormat::Float, 32) => {
                    let read: std::result::Result<Vec<f32>, _> =
                        reader.samples::<f32>().collect();
                    let read = read
                        .map_err(|e| NormkitError::audio(format!("Failed to read sample: {e}")))?;
                    (read, SampleEncoding::Float32)
                }
                (format, bits) => {
                    return Err(NormkitError::audio(format!(
                        "Unsupported WAV encoding: {bits}-bit {format:?}"
                    )))
                }
            };

        let channels = spec.channels as usize;
        let n_frames = samples.len() / channels;
        let frames = Array2::from_shape_vec((n_frames, channels), samples)
            .map_err(|e| NormkitError::audio(format!("Malformed sample buffer: {e}")))?;

        Sound::new(frames, spec.sample_rate, encoding)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let spec = WavSpec {
            channels: self.channels() as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: self.encoding.bits_per_sample(),
            sample_format: self.encoding.sample_format(),
        };
        let file = File::create(path).map_err(|e| {
            NormkitError::audio(format!("Cannot create {}: {e}", path.display()))
        })?;
        let mut writer = WavWriter::new(file, spec)
            .map_err(|e| NormkitError::audio(format!("Cannot write {}: {e}", path.display())))?;

        for frame in self.frames.rows() {
            for &sample in frame.iter() {
                let clamped = sample.clamp(-1.0, 1.0);
                match self.encoding {
                    SampleEncoding::Float32 => writer.write_sample(clamped),
                    SampleEncoding::Int16 => writer.write_sample((clamped * 32767.0) as i16),
                }
                .map_err(|e| NormkitError::audio(format!("Failed to write sample: {e}")))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| NormkitError::audio(format!("Failed to finalize WAV: {e}")))?;
        Ok(())
    }

    pub fn frames(&self) -> &Array2<f32> {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut Array2<f32> {
        &mut self.frames
    }

    pub fn n_frames(&self) -> usize {
        self.frames.nrows()
    }

    pub fn channels(&self) -> usize {
        self.frames.ncols()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    pub fn duration(&self) -> f64 {
        self.n_frames() as f64 / f64::from(self.sample_rate)
    }

    /// First channel, the one boundary snapping searches.
    pub fn channel0(&self) -> ArrayView1<'_, f32> {
        self.frames.column(0)
    }

    /// Frame index for a time, clamped to the valid range.
    pub fn frame_at(&self, time: f64) -> usize {
        let idx = (time * f64::from(self.sample_rate)).round();
        (idx.max(0.0) as usize).min(self.n_frames())
    }

    /// Cut out the part between two times as a new sound.
    pub fn extract_part(&self, from_time: f64, to_time: f64) -> Result<Sound> {
        if to_time <= from_time {
            return Err(NormkitError::audio(format!(
                "Extraction window is empty: {from_time:.3}..{to_time:.3}"
            )));
        }
        let start = self.frame_at(from_time);
        let end = self.frame_at(to_time);
        let frames = self.frames.slice(s![start..end, ..]).to_owned();
        Sound::new(frames, self.sample_rate, self.encoding)
    }
}
