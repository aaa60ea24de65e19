/// Simple statistics over result series, such as percentiles and conditional means.
use statrs::statistics::{Data, OrderStatistics};

pub fn percentile(numbers: &[f64], percentile: usize) -> f64 {
    let mut data = Data::new(numbers.to_vec());

    data.percentile(percentile)
}

/// Mean of the values whose paired condition holds, or `None` when no value qualifies.
pub fn conditional_mean<'a>(values: impl IntoIterator<Item = (&'a f64, bool)>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|(_, include)| *include)
        .fold((0., 0usize), |(sum, count), (value, _)| (sum + value, count + 1));

    (count > 0).then(|| sum / count as f64)
}
