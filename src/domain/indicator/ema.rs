//! Exponential Moving Average.
//!
//! alpha = 2/(span+1). No seeding: the first output equals the first input, then
//! EMA[i] = alpha*x[i] + (1-alpha)*EMA[i-1]. Valid from the first bar.

#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Ema {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

pub fn ema(series: &[f64], span: usize) -> Vec<f64> {
    let mut state = Ema::new(span);
    series.iter().map(|&x| state.update(x)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ema_first_output_is_first_input() {
        let out = ema(&[10.0, 20.0, 30.0], 3);
        assert_relative_eq!(out[0], 10.0);
    }

    #[test]
    fn ema_recursive_calculation() {
        let out = ema(&[10.0, 20.0, 30.0, 40.0], 3);
        let k = 0.5;
        let e1 = k * 20.0 + (1.0 - k) * 10.0;
        let e2 = k * 30.0 + (1.0 - k) * e1;
        let e3 = k * 40.0 + (1.0 - k) * e2;
        assert_relative_eq!(out[1], e1);
        assert_relative_eq!(out[2], e2);
        assert_relative_eq!(out[3], e3);
    }

    #[test]
    fn ema_smoothing_factor() {
        let mut state = Ema::new(10);
        state.update(0.0);
        assert_relative_eq!(state.update(11.0), 2.0);
    }

    #[test]
    fn ema_span_1_tracks_input() {
        let out = ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_empty_series() {
        assert!(ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_value_before_update_is_none() {
        let mut state = Ema::new(5);
        assert_eq!(state.value(), None);
        state.update(42.0);
        assert_eq!(state.value(), Some(42.0));
    }
}
