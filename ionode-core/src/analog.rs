//! Analog input averaging
//!
//! One sample per tick; every [`SAMPLES_PER_AVERAGE`] samples the average
//! becomes the published reading.

use ionode_hal::ANALOG_FULL_SCALE;

/// Samples accumulated per published value
pub const SAMPLES_PER_AVERAGE: u32 = 256;

/// Value a saturated converter reading is counted as
pub const SATURATED_VALUE: u32 = ANALOG_FULL_SCALE as u32 + 1;

/// Largest published value
pub const MAX_PUBLISHED: u32 = SATURATED_VALUE;

/// Averages below this publish as zero
pub const NOISE_FLOOR: u32 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalogSampler {
    samples: u32,
    sum: u32,
    published: u32,
}

impl AnalogSampler {
    pub const fn new() -> Self {
        Self {
            samples: 0,
            sum: 0,
            published: 0,
        }
    }

    /// Accumulate one raw sample, returning the new reading when one is
    /// published
    pub fn push(&mut self, raw: u16) -> Option<u32> {
        let value = match u32::from(raw) {
            raw if raw >= u32::from(ANALOG_FULL_SCALE) => SATURATED_VALUE,
            raw => raw,
        };
        self.sum += value;
        self.samples += 1;

        if self.samples < SAMPLES_PER_AVERAGE {
            return None;
        }

        let average = (self.sum / SAMPLES_PER_AVERAGE).min(MAX_PUBLISHED);
        self.published = if average < NOISE_FLOOR { 0 } else { average };
        self.samples = 0;
        self.sum = 0;
        Some(self.published)
    }

    /// Last published reading
    pub fn value(&self) -> u32 {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(sampler: &mut AnalogSampler, raw: u16, count: u32) -> Option<u32> {
        let mut last = None;
        for _ in 0..count {
            last = sampler.push(raw);
        }
        last
    }

    #[test]
    fn test_publishes_average_every_256_samples() {
        let mut sampler = AnalogSampler::new();
        assert_eq!(feed(&mut sampler, 512, 255), None);
        assert_eq!(sampler.value(), 0);
        assert_eq!(sampler.push(512), Some(512));
        assert_eq!(sampler.value(), 512);
    }

    #[test]
    fn test_noise_floor_publishes_zero() {
        let mut sampler = AnalogSampler::new();
        assert_eq!(feed(&mut sampler, 512, 256), Some(512));
        assert_eq!(feed(&mut sampler, 3, 256), Some(0));
    }

    #[test]
    fn test_saturated_reads_full_scale_plus_one() {
        let mut sampler = AnalogSampler::new();
        assert_eq!(feed(&mut sampler, 1023, 256), Some(1024));
        assert_eq!(feed(&mut sampler, u16::MAX, 256), Some(1024));
    }
}
