//! Token sampling strategies

use anyhow::Result;
use candle_core::Tensor;

pub struct Sampler {
    temperature: f32,
    top_p: f32,
    rng_state: u64,
}

impl Sampler {
    pub fn new(temperature: f32, top_p: f32, seed: u64) -> Self {
        Self {
            temperature,
            top_p,
            // xorshift gets stuck at zero
            rng_state: seed.max(1),
        }
    }

    pub fn sample(&mut self, logits: &Tensor) -> Result<u32> {
        let logits = logits.to_dtype(candle_core::DType::F32)?;
        let logits = logits.to_vec1::<f32>()?;

        // Temperature 0 means greedy decoding
        if self.temperature <= 0.0 {
            return Ok(argmax(&logits));
        }

        // Apply temperature
        let scaled: Vec<f32> = logits.iter().map(|&x| x / self.temperature).collect();

        // Softmax
        let max_logit = scaled.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = scaled.iter().map(|&x| (x - max_logit).exp()).collect();
        let sum: f32 = exp.iter().sum();
        let probs: Vec<f32> = exp.iter().map(|&x| x / sum).collect();

        // Top-p (nucleus) sampling
        let token = if self.top_p < 1.0 {
            self.sample_top_p(&probs)
        } else {
            self.sample_multinomial(&probs)
        };

        Ok(token)
    }

    fn sample_top_p(&mut self, probs: &[f32]) -> u32 {
        // Sort by probability descending
        let mut indexed: Vec<(usize, f32)> = probs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        // Find cutoff for top-p
        let mut cumsum = 0.0;
        let mut cutoff_idx = indexed.len();
        for (i, (_, p)) in indexed.iter().enumerate() {
            cumsum += p;
            if cumsum >= self.top_p {
                cutoff_idx = i + 1;
                break;
            }
        }

        // Renormalize and sample
        let candidates = &indexed[..cutoff_idx];
        let sum: f32 = candidates.iter().map(|(_, p)| p).sum();
        let normalized: Vec<f32> = candidates.iter().map(|(_, p)| p / sum).collect();

        let r = self.random_f32();
        let mut cumsum = 0.0;
        for (i, p) in normalized.iter().enumerate() {
            cumsum += p;
            if r < cumsum {
                return candidates[i].0 as u32;
            }
        }

        candidates.last().map(|(idx, _)| *idx as u32).unwrap_or(0)
    }

    fn sample_multinomial(&mut self, probs: &[f32]) -> u32 {
        let r = self.random_f32();
        let mut cumsum = 0.0;
        for (i, &p) in probs.iter().enumerate() {
            cumsum += p;
            if r < cumsum {
                return i as u32;
            }
        }
        (probs.len() - 1) as u32
    }

    fn random_f32(&mut self) -> f32 {
        // xorshift64
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;

        // Convert to f32 in [0, 1)
        (self.rng_state as f64 / u64::MAX as f64) as f32
    }
}

fn argmax(xs: &[f32]) -> u32 {
    let mut best = 0usize;
    for (i, &x) in xs.iter().enumerate() {
        if x > xs[best] {
            best = i;
        }
    }
    best as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn logits(values: &[f32]) -> Tensor {
        Tensor::new(values, &Device::Cpu).unwrap()
    }

    #[test]
    fn zero_temperature_is_greedy() {
        let mut sampler = Sampler::new(0.0, 0.9, 7);
        let token = sampler.sample(&logits(&[0.1, 3.5, -2.0, 1.0])).unwrap();
        assert_eq!(token, 1);
    }

    #[test]
    fn narrow_nucleus_picks_the_dominant_token() {
        // One token holds nearly all probability mass; top-p 0.5 keeps
        // only that token no matter what the PRNG says.
        let mut sampler = Sampler::new(1.0, 0.5, 1234);
        for _ in 0..16 {
            let token = sampler.sample(&logits(&[0.0, 20.0, 0.0])).unwrap();
            assert_eq!(token, 1);
        }
    }

    #[test]
    fn same_seed_gives_same_tokens() {
        let values = [1.0f32, 1.1, 0.9, 1.05];
        let mut a = Sampler::new(0.8, 1.0, 42);
        let mut b = Sampler::new(0.8, 1.0, 42);
        for _ in 0..8 {
            assert_eq!(
                a.sample(&logits(&values)).unwrap(),
                b.sample(&logits(&values)).unwrap()
            );
        }
    }
}
