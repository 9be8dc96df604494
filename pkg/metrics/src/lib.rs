use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{PoisonError, RwLock};

/// Sorted `(label, value)` pairs identifying one series inside a family.
type LabelSet = Vec<(String, String)>;

/// A lightweight, thread-safe metrics registry that renders in Prometheus text exposition format.
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<String, Family<u64>>>,
    gauges: RwLock<BTreeMap<String, Family<i64>>>,
}

/// All series of one metric name.
struct Family<V> {
    help: String,
    series: BTreeMap<LabelSet, V>,
}

impl<V> Family<V> {
    fn new(help: &str) -> Self {
        Self {
            help: help.to_string(),
            series: BTreeMap::new(),
        }
    }
}

fn label_set(labels: &[(&str, &str)]) -> LabelSet {
    let mut set: LabelSet = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    set.sort();
    set
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a counter. If it already exists, this is a no-op.
    pub fn register_counter(&self, name: &str, help: &str) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        counters
            .entry(name.to_string())
            .or_insert_with(|| Family::new(help));
    }

    /// Register a gauge. If it already exists, this is a no-op.
    pub fn register_gauge(&self, name: &str, help: &str) {
        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        gauges
            .entry(name.to_string())
            .or_insert_with(|| Family::new(help));
    }

    /// Increment a counter series by 1.
    pub fn counter_inc(&self, name: &str, labels: &[(&str, &str)]) {
        self.counter_add(name, labels, 1);
    }

    /// Increment a counter series by a given amount.
    pub fn counter_add(&self, name: &str, labels: &[(&str, &str)], val: u64) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(family) = counters.get_mut(name) {
            let value = family.series.entry(label_set(labels)).or_insert(0);
            *value = value.saturating_add(val);
        }
    }

    /// Current value of a counter series, `None` if it was never touched.
    pub fn counter_get(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(name)
            .and_then(|f| f.series.get(&label_set(labels)).copied())
    }

    /// Set a gauge series to a specific value.
    pub fn gauge_set(&self, name: &str, labels: &[(&str, &str)], val: i64) {
        self.gauge_set_many(labels, &[(name, val)]);
    }

    /// Set several gauges that share one label set.
    ///
    /// All writes happen under a single lock, so a concurrent `render`
    /// observes either none or all of them.
    pub fn gauge_set_many(&self, labels: &[(&str, &str)], values: &[(&str, i64)]) {
        let key = label_set(labels);
        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        for (name, val) in values {
            if let Some(family) = gauges.get_mut(*name) {
                family.series.insert(key.clone(), *val);
            }
        }
    }

    /// Current value of a gauge series, `None` if it was never set.
    pub fn gauge_get(&self, name: &str, labels: &[(&str, &str)]) -> Option<i64> {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        gauges
            .get(name)
            .and_then(|f| f.series.get(&label_set(labels)).copied())
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut output = String::new();

        // Counters
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        for (name, family) in counters.iter() {
            render_family(&mut output, name, "counter", family);
        }
        drop(counters);

        // Gauges
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        for (name, family) in gauges.iter() {
            render_family(&mut output, name, "gauge", family);
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn render_family<V: std::fmt::Display>(
    out: &mut String,
    name: &str,
    kind: &str,
    family: &Family<V>,
) {
    let _ = writeln!(out, "# HELP {} {}", name, family.help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
    for (labels, value) in &family.series {
        if labels.is_empty() {
            let _ = writeln!(out, "{} {}", name, value);
            continue;
        }
        let rendered: Vec<String> = labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect();
        let _ = writeln!(out, "{}{{{}}} {}", name, rendered.join(","), value);
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
