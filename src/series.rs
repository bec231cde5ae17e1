use indexmap::IndexMap;

use crate::record::Record;

/// primary key -> secondary key -> records, both key levels in first-insertion order.
#[derive(Debug, Clone)]
pub struct KeyedTimeSeriesStore<C> {
    series: IndexMap<String, IndexMap<String, Vec<Record<C>>>>,
}

impl<C> Default for KeyedTimeSeriesStore<C> {
    fn default() -> Self {
        Self {
            series: IndexMap::new(),
        }
    }
}

impl<C> KeyedTimeSeriesStore<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, primary: &str, secondary: &str, record: Record<C>) {
        self.series
            .entry(primary.to_string())
            .or_default()
            .entry(secondary.to_string())
            .or_default()
            .push(record);
    }

    pub fn records(&self, primary: &str, secondary: &str) -> &[Record<C>] {
        self.series
            .get(primary)
            .and_then(|inner| inner.get(secondary))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Records whose timestamp lies in `[start, end]`, in append order.
    pub fn records_in_range(
        &self,
        primary: &str,
        secondary: &str,
        start: i64,
        end: i64,
    ) -> Vec<&Record<C>> {
        self.records(primary, secondary)
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .collect()
    }

    /// Share of records matching `is_positive`, 0-100. Empty series yield 0.
    pub fn percentage<F>(&self, primary: &str, secondary: &str, is_positive: F) -> f64
    where
        F: Fn(&Record<C>) -> bool,
    {
        let records = self.records(primary, secondary);
        if records.is_empty() {
            return 0.0;
        }
        let hits = records.iter().filter(|r| is_positive(r)).count();
        100.0 * hits as f64 / records.len() as f64
    }

    pub fn primaries(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn secondaries(&self, primary: &str) -> Vec<&str> {
        self.series
            .get(primary)
            .map(|inner| inner.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }

    /// Every primary's series stored under `secondary`, in primary insertion order.
    pub fn series_for_secondary<'a>(
        &'a self,
        secondary: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [Record<C>])> + 'a {
        self.series.iter().filter_map(move |(primary, inner)| {
            inner
                .get(secondary)
                .map(|records| (primary.as_str(), records.as_slice()))
        })
    }

    /// Drops one series. Returns how many records were removed.
    pub fn remove_series(&mut self, primary: &str, secondary: &str) -> usize {
        let Some(inner) = self.series.get_mut(primary) else {
            return 0;
        };
        let removed = inner.shift_remove(secondary).map(|v| v.len()).unwrap_or(0);
        if inner.is_empty() {
            self.series.shift_remove(primary);
        }
        removed
    }
}
