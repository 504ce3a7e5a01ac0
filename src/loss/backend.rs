use rayon::prelude::*;
use serde::{Serialize, Deserialize};

/// Selects how elementwise kernels are scheduled.
///
/// - `Serial`   — a single in-order pass on the calling thread.
/// - `Parallel` — a rayon parallel map; elements are independent so the
///   result is identical to `Serial`, only the schedule differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Serial,
    Parallel,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Serial => "serial",
            Backend::Parallel => "parallel",
        }
    }

    pub(crate) fn map<T, F>(&self, input: &[T], functor: F) -> Vec<T>
    where
        T: Copy + Send + Sync,
        F: Fn(T) -> T + Send + Sync,
    {
        match self {
            Backend::Serial => input.iter().map(|&x| functor(x)).collect(),
            Backend::Parallel => input.par_iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Callers guarantee `lhs.len() == rhs.len()`.
    pub(crate) fn zip_map<T, F>(&self, lhs: &[T], rhs: &[T], functor: F) -> Vec<T>
    where
        T: Copy + Send + Sync,
        F: Fn(T, T) -> T + Send + Sync,
    {
        debug_assert_eq!(lhs.len(), rhs.len());
        match self {
            Backend::Serial => lhs.iter().zip(rhs.iter()).map(|(&a, &b)| functor(a, b)).collect(),
            Backend::Parallel => lhs
                .par_iter()
                .zip(rhs.par_iter())
                .map(|(&a, &b)| functor(a, b))
                .collect(),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(Backend::Serial),
            "parallel" => Ok(Backend::Parallel),
            other => Err(format!("unknown backend `{other}` (expected serial or parallel)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_preserves_element_order() {
        let a: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..10_000).map(|i| (i * 3) as f64).collect();
        let serial = Backend::Serial.zip_map(&a, &b, |x, y| y - x);
        let parallel = Backend::Parallel.zip_map(&a, &b, |x, y| y - x);
        assert_eq!(serial, parallel);
        assert_eq!(parallel[17], 34.0);
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!("Parallel".parse::<Backend>().unwrap(), Backend::Parallel);
        assert!("npu".parse::<Backend>().is_err());
    }
}
