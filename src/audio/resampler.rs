use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use super::AudioError;

/// Sample rate the emotion encoder expects
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Input chunk size fed to the FFT resampler
const CHUNK_FRAMES: usize = 1024;

/// Mono resampler from a file's native rate to 16kHz
pub struct AudioResampler {
    resampler: FftFixedIn<f32>,
    input_buffer: Vec<Vec<f32>>,
    output_buffer: Vec<Vec<f32>>,
    input_frames: usize,
}

impl AudioResampler {
    pub fn new(source_sample_rate: u32) -> Result<Self, AudioError> {
        if source_sample_rate == 0 {
            return Err(AudioError::InvalidFormat("sample rate is 0".to_string()));
        }

        debug!(
            "Creating resampler: {} Hz -> {} Hz (ratio: {:.4})",
            source_sample_rate,
            TARGET_SAMPLE_RATE,
            TARGET_SAMPLE_RATE as f64 / source_sample_rate as f64
        );

        let resampler = FftFixedIn::new(
            source_sample_rate as usize,
            TARGET_SAMPLE_RATE as usize,
            CHUNK_FRAMES,
            2, // sub_chunks for quality
            1, // mono
        )
        .map_err(|e| AudioError::Resample(e.to_string()))?;

        let input_buffer = vec![vec![0.0f32; CHUNK_FRAMES]; 1];
        let output_buffer = resampler.output_buffer_allocate(true);

        Ok(Self {
            resampler,
            input_buffer,
            output_buffer,
            input_frames: CHUNK_FRAMES,
        })
    }

    /// Number of input frames each `process` call consumes
    pub fn input_frames_next(&self) -> usize {
        self.input_frames
    }

    /// Output frames of latency introduced by the FFT filter
    pub fn output_delay(&self) -> usize {
        self.resampler.output_delay()
    }

    /// Resample exactly `input_frames_next()` samples
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, AudioError> {
        if input.len() != self.input_frames {
            return Err(AudioError::Resample(format!(
                "Input length {} doesn't match expected {}",
                input.len(),
                self.input_frames
            )));
        }

        self.input_buffer[0].copy_from_slice(input);

        let (_, output_frames) = self
            .resampler
            .process_into_buffer(&self.input_buffer, &mut self.output_buffer, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;

        Ok(self.output_buffer[0][..output_frames].to_vec())
    }
}

/// Resample a whole mono buffer to 16kHz.
///
/// The tail is zero-padded to a full chunk and silent chunks are pushed
/// through until the delayed signal is flushed. The filter delay is dropped
/// from the front and the output trimmed to `len * 16000 / source_rate`
/// samples, so output sample `i` lines up with input time `i / 16000`.
pub fn resample_to_target(samples: &[f32], source_sample_rate: u32) -> Result<Vec<f32>, AudioError> {
    if source_sample_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }

    let mut resampler = AudioResampler::new(source_sample_rate)?;
    let frames = resampler.input_frames_next();
    let delay = resampler.output_delay();
    let expected =
        (samples.len() as u64 * TARGET_SAMPLE_RATE as u64 / source_sample_rate as u64) as usize;

    let mut output = Vec::with_capacity(expected + delay + frames);
    let mut chunk = vec![0.0f32; frames];

    for block in samples.chunks(frames) {
        chunk[..block.len()].copy_from_slice(block);
        chunk[block.len()..].fill(0.0);
        output.extend(resampler.process(&chunk)?);
    }

    chunk.fill(0.0);
    while output.len() < expected + delay {
        let flushed = resampler.process(&chunk)?;
        if flushed.is_empty() {
            return Err(AudioError::Resample("resampler produced no output".to_string()));
        }
        output.extend(flushed);
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampled_tone_keeps_level() {
        let input: Vec<f32> = (0..48000)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        let output = resample_to_target(&input, 48000).unwrap();
        assert_eq!(output.len(), 16000);

        // skip the resampler's start-up delay
        let steady = &output[4000..12000];
        let rms = (steady.iter().map(|s| s * s).sum::<f32>() / steady.len() as f32).sqrt();
        assert!((rms - 0.3536).abs() < 0.03, "rms {}", rms);
    }

    #[test]
    fn test_impulse_stays_aligned() {
        let mut input = vec![0.0f32; 48000];
        input[4800] = 1.0; // 100ms
        let output = resample_to_target(&input, 48000).unwrap();
        assert_eq!(output.len(), 16000);

        let peak = output
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i64 - 1600).abs() <= 2, "peak at {}", peak);
    }

    #[test]
    fn test_tail_is_kept() {
        let mut input = vec![0.0f32; 44100];
        let n = input.len();
        input[n - 441..].fill(0.5); // last 10ms
        let output = resample_to_target(&input, 44100).unwrap();
        // stay clear of the edge at the very end of the buffer
        let tail = &output[output.len() - 100..output.len() - 10];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!((mean - 0.5).abs() < 0.1, "tail mean {}", mean);
    }

    #[test]
    fn test_resample_whole_buffer_length() {
        let input = vec![0.1f32; 44100];
        let output = resample_to_target(&input, 44100).unwrap();
        assert_eq!(output.len(), 16000);
    }

    #[test]
    fn test_resample_passthrough_at_target_rate() {
        let input: Vec<f32> = (0..100).map(|i| i as f32).collect();
        assert_eq!(resample_to_target(&input, 16000).unwrap(), input);
    }

    #[test]
    fn test_rejects_wrong_chunk_length() {
        let mut resampler = AudioResampler::new(22050).unwrap();
        assert!(matches!(
            resampler.process(&[0.0; 10]),
            Err(AudioError::Resample(_))
        ));
    }

    #[test]
    fn test_zero_rate_is_invalid() {
        assert!(matches!(
            AudioResampler::new(0),
            Err(AudioError::InvalidFormat(_))
        ));
    }
}
