//! Forecast summary labels

/// The summary labels used for synthetic observations, coldest first
pub const FORECAST_SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique() {
        let mut labels = FORECAST_SUMMARIES.to_vec();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), FORECAST_SUMMARIES.len());
    }
}
