//! Sample-level audio operations
//!
//! Peak and intensity scaling follow the Praat conventions the recordings
//! were originally normalized with: intensity is measured in dB SPL against
//! the 20 micropascal reference.

use crate::audio::{SampleEncoding, Sound};
use crate::error::{NormkitError, Result};
use ndarray::Array2;

/// Auditory reference pressure, 20 micropascal.
const REFERENCE_PRESSURE: f64 = 2.0e-5;

/// Largest absolute sample value across all channels.
pub fn peak(sound: &Sound) -> f32 {
    sound
        .frames()
        .iter()
        .fold(0.0f32, |acc, &v| acc.max(v.abs()))
}

/// Scale so the largest absolute sample equals `target`.
///
/// Silent audio is left untouched.
pub fn scale_peak(sound: &mut Sound, target: f32) {
    let current = peak(sound);
    if current <= 0.0 {
        return;
    }
    let factor = target / current;
    sound.frames_mut().mapv_inplace(|v| v * factor);
}

/// Average intensity in dB SPL, or None for silent audio.
pub fn intensity_db(sound: &Sound) -> Option<f64> {
    let n = sound.frames().len();
    if n == 0 {
        return None;
    }
    let mean_square: f64 = sound
        .frames()
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        / n as f64;
    if mean_square <= 0.0 {
        return None;
    }
    Some(10.0 * (mean_square / (REFERENCE_PRESSURE * REFERENCE_PRESSURE)).log10())
}

/// Scale so the average intensity equals `target_db`.
pub fn scale_intensity(sound: &mut Sound, target_db: f64) {
    let Some(current) = intensity_db(sound) else {
        return;
    };
    let factor = 10f64.powf((target_db - current) / 20.0) as f32;
    sound.frames_mut().mapv_inplace(|v| v * factor);
}

/// Join sounds end to end. Sample rate and channel count must agree.
pub fn concatenate(sounds: &[Sound]) -> Result<Sound> {
    let first = sounds
        .first()
        .ok_or_else(|| NormkitError::audio("Nothing to concatenate"))?;
    let sample_rate = first.sample_rate();
    let channels = first.channels();

    let mut total = 0usize;
    for sound in sounds {
        if sound.sample_rate() != sample_rate {
            return Err(NormkitError::audio(format!(
                "Sample rate mismatch in concatenation: {} vs {}",
                sound.sample_rate(),
                sample_rate
            )));
        }
        if sound.channels() != channels {
            return Err(NormkitError::audio(format!(
                "Channel count mismatch in concatenation: {} vs {}",
                sound.channels(),
                channels
            )));
        }
        total += sound.n_frames();
    }

    let mut frames = Array2::zeros((total, channels));
    let mut offset = 0;
    for sound in sounds {
        let n = sound.n_frames();
        frames
            .slice_mut(ndarray::s![offset..offset + n, ..])
            .assign(sound.frames());
        offset += n;
    }

    Sound::new(frames, sample_rate, first.encoding())
}

/// A stretch of silence matching the given shape.
pub fn silence(
    duration: f64,
    sample_rate: u32,
    channels: usize,
    encoding: SampleEncoding,
) -> Result<Sound> {
    let n = (duration * f64::from(sample_rate)).round().max(0.0) as usize;
    Sound::new(Array2::zeros((n, channels)), sample_rate, encoding)
}

/// Pad a sound with `padding` seconds of silence on both sides.
pub fn pad_with_silence(sound: &Sound, padding: f64) -> Result<Sound> {
    let gap = silence(
        padding,
        sound.sample_rate(),
        sound.channels(),
        sound.encoding(),
    )?;
    concatenate(&[gap.clone(), sound.clone(), gap])
}

/// Move a boundary time to the nearest zero crossing of the first channel.
///
/// Returns the input time unchanged when no crossing exists.
pub fn nearest_zero_crossing(sound: &Sound, time: f64) -> f64 {
    let samples = sound.channel0();
    let n = samples.len();
    if n < 2 {
        return time;
    }

    let center = sound.frame_at(time).min(n - 1);
    let crossing_at = |i: usize| -> bool {
        i > 0 && (samples[i - 1] <= 0.0) != (samples[i] <= 0.0)
    };

    for offset in 0..n {
        let right = center + offset;
        if right < n && crossing_at(right) {
            return right as f64 / f64::from(sound.sample_rate());
        }
        if offset > 0 && offset <= center {
            let left = center - offset;
            if crossing_at(left) {
                return left as f64 / f64::from(sound.sample_rate());
            }
        }
        if right >= n && offset > center {
            break;
        }
    }

    time
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sound_of(samples: Vec<f32>, sample_rate: u32) -> Sound {
        let n = samples.len();
        let frames = Array2::from_shape_vec((n, 1), samples).unwrap();
        Sound::new(frames, sample_rate, SampleEncoding::Int16).unwrap()
    }

    #[test]
    fn test_scale_peak() {
        let mut sound = sound_of(vec![0.1, -0.5, 0.25], 16000);
        scale_peak(&mut sound, 0.99);
        assert!((peak(&sound) - 0.99).abs() < 1e-6);
        assert!((sound.frames()[[0, 0]] - 0.198).abs() < 1e-5);
    }

    #[test]
    fn test_scale_peak_silent_input() {
        let mut sound = sound_of(vec![0.0; 10], 16000);
        scale_peak(&mut sound, 0.99);
        assert_eq!(peak(&sound), 0.0);
    }

    #[test]
    fn test_scale_intensity() {
        let mut sound = sound_of(vec![0.01; 1000], 16000);
        scale_intensity(&mut sound, 70.0);
        let db = intensity_db(&sound).unwrap();
        assert!((db - 70.0).abs() < 1e-3, "got {db}");
    }

    #[test]
    fn test_intensity_db_of_known_signal() {
        // Constant 0.02 amplitude is 60 dB re 20 uPa
        let sound = sound_of(vec![0.02; 100], 16000);
        let db = intensity_db(&sound).unwrap();
        assert!((db - 60.0).abs() < 1e-6, "got {db}");

        assert!(intensity_db(&sound_of(vec![0.0; 100], 16000)).is_none());
    }

    #[test]
    fn test_concatenate() {
        let a = sound_of(vec![0.1, 0.2], 16000);
        let b = sound_of(vec![0.3], 16000);
        let joined = concatenate(&[a, b]).unwrap();
        assert_eq!(joined.n_frames(), 3);
        assert_eq!(joined.frames()[[2, 0]], 0.3);
    }

    #[test]
    fn test_concatenate_mismatch() {
        let a = sound_of(vec![0.1], 16000);
        let b = sound_of(vec![0.2], 44100);
        assert!(concatenate(&[a.clone(), b]).is_err());

        let stereo = Sound::new(
            array![[0.1f32, 0.1], [0.2, 0.2]],
            16000,
            SampleEncoding::Int16,
        )
        .unwrap();
        assert!(concatenate(&[a, stereo]).is_err());
        assert!(concatenate(&[]).is_err());
    }

    #[test]
    fn test_silence_and_padding() {
        let gap = silence(0.25, 44100, 1, SampleEncoding::Int16).unwrap();
        assert_eq!(gap.n_frames(), 11025);
        assert_eq!(peak(&gap), 0.0);

        let token = sound_of(vec![0.5; 100], 44100);
        let padded = pad_with_silence(&token, 0.25).unwrap();
        assert_eq!(padded.n_frames(), 100 + 2 * 11025);
        assert_eq!(padded.frames()[[0, 0]], 0.0);
        assert_eq!(padded.frames()[[11025, 0]], 0.5);
    }

    #[test]
    fn test_nearest_zero_crossing() {
        // Sign change between samples 4 and 5
        let sound = sound_of(vec![0.5, 0.4, 0.3, 0.2, 0.1, -0.1, -0.2, -0.3], 8);
        let snapped = nearest_zero_crossing(&sound, 2.0 / 8.0);
        assert!((snapped - 5.0 / 8.0).abs() < 1e-9, "got {snapped}");

        // Already at the crossing
        let snapped = nearest_zero_crossing(&sound, 5.0 / 8.0);
        assert!((snapped - 5.0 / 8.0).abs() < 1e-9);

        // No crossing at all: time unchanged
        let flat = sound_of(vec![0.5; 8], 8);
        let unchanged = nearest_zero_crossing(&flat, 0.25);
        assert!((unchanged - 0.25).abs() < 1e-9);
    }
}
