use ndarray::Array2;

use crate::slice::PixelData;

/// Aggregate statistics over one slice's pixel values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub total_pixels: usize,
}

/// Min, max and arithmetic mean of the slice; the mean is NaN for an empty array.
pub fn pixel_statistics(pixels: &PixelData) -> PixelStatistics {
    compute_stats(&pixels.to_f64())
}

fn compute_stats(array: &Array2<f64>) -> PixelStatistics {
    let min = array.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = array.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let sum: f64 = array.iter().sum();
    let count = array.len();
    let mean = sum / count as f64;

    PixelStatistics {
        min,
        max,
        mean,
        total_pixels: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn mean_of_small_slice() {
        let pixels = PixelData::U16(array![[0, 0], [10, 20]]);
        let stats = pixel_statistics(&pixels);
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 20.0);
        assert_eq!(stats.total_pixels, 4);
    }

    #[test]
    fn signed_values_do_not_wrap() {
        let pixels = PixelData::I16(array![[-1024, -1024], [i16::MAX, i16::MAX]]);
        let stats = pixel_statistics(&pixels);
        assert_eq!(stats.mean, (f64::from(i16::MAX) - 1024.0) / 2.0);
        assert_eq!(stats.min, -1024.0);
    }
}
