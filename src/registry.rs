//! The registry read contract and the snapshot data model.
//!
//! The bridge never stores metrics itself; each push cycle asks a [`Collect`]
//! implementation for a fresh snapshot. The crate ships an adapter for
//! [`prometheus::Registry`] that flattens gathered families into the flat
//! per-sample form the encoder works on.

use std::collections::HashMap;

use prometheus::proto;
use prometheus::proto::MetricType;

/// One (metric name, label set, value) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, labels: HashMap<String, String>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }
}

/// An ordered collection of samples sharing an originating metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Read-only snapshot source consumed by the bridge.
///
/// Implementations must tolerate repeated and concurrent calls; each push
/// cycle collects once and retains nothing.
pub trait Collect: Send + Sync {
    fn collect(&self) -> Vec<MetricFamily>;
}

impl Collect for prometheus::Registry {
    fn collect(&self) -> Vec<MetricFamily> {
        self.gather().iter().map(flatten_family).collect()
    }
}

/// Flatten one gathered protobuf family into per-sample form.
///
/// Counters, gauges and untyped metrics yield one sample each. Histograms
/// yield a cumulative `_bucket` sample per bound (with an `le` label, plus
/// the implicit `+Inf` bucket) and `_sum`/`_count` samples. Summaries yield
/// one sample per quantile (with a `quantile` label) and `_sum`/`_count`.
fn flatten_family(family: &proto::MetricFamily) -> MetricFamily {
    let name = family.name();
    let mut samples = Vec::new();

    for metric in &family.metric {
        let labels: HashMap<String, String> = metric
            .label
            .iter()
            .map(|pair| (pair.name().to_string(), pair.value().to_string()))
            .collect();

        match family.type_() {
            MetricType::COUNTER => {
                samples.push(Sample::new(name, labels, metric.counter.value()));
            }
            MetricType::GAUGE => {
                samples.push(Sample::new(name, labels, metric.gauge.value()));
            }
            MetricType::UNTYPED => {
                samples.push(Sample::new(name, labels, metric.untyped.value()));
            }
            MetricType::HISTOGRAM => {
                let histogram = &metric.histogram;
                let mut has_inf_bucket = false;
                for bucket in &histogram.bucket {
                    let bound = bucket.upper_bound();
                    has_inf_bucket |= bound.is_infinite();
                    let mut bucket_labels = labels.clone();
                    bucket_labels.insert("le".to_string(), bound_label(bound));
                    samples.push(Sample::new(
                        format!("{name}_bucket"),
                        bucket_labels,
                        bucket.cumulative_count() as f64,
                    ));
                }
                if !has_inf_bucket {
                    let mut bucket_labels = labels.clone();
                    bucket_labels.insert("le".to_string(), "+Inf".to_string());
                    samples.push(Sample::new(
                        format!("{name}_bucket"),
                        bucket_labels,
                        histogram.sample_count() as f64,
                    ));
                }
                samples.push(Sample::new(
                    format!("{name}_sum"),
                    labels.clone(),
                    histogram.sample_sum(),
                ));
                samples.push(Sample::new(
                    format!("{name}_count"),
                    labels,
                    histogram.sample_count() as f64,
                ));
            }
            MetricType::SUMMARY => {
                let summary = &metric.summary;
                for quantile in &summary.quantile {
                    let mut quantile_labels = labels.clone();
                    quantile_labels
                        .insert("quantile".to_string(), format!("{:?}", quantile.quantile()));
                    samples.push(Sample::new(name, quantile_labels, quantile.value()));
                }
                samples.push(Sample::new(
                    format!("{name}_sum"),
                    labels.clone(),
                    summary.sample_sum(),
                ));
                samples.push(Sample::new(
                    format!("{name}_count"),
                    labels,
                    summary.sample_count() as f64,
                ));
            }
        }
    }

    MetricFamily {
        name: name.to_string(),
        samples,
    }
}

fn bound_label(bound: f64) -> String {
    if bound.is_infinite() {
        if bound.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else {
        format!("{bound:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};

    fn sample<'a>(families: &'a [MetricFamily], name: &str) -> Vec<&'a Sample> {
        families
            .iter()
            .flat_map(|family| family.samples.iter())
            .filter(|sample| sample.name == name)
            .collect()
    }

    #[test]
    fn test_counter_vec_flattens_to_labeled_samples() {
        let registry = Registry::new();
        let requests = CounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "code"],
        )
        .unwrap();
        registry.register(Box::new(requests.clone())).unwrap();
        requests.with_label_values(&["GET", "200"]).inc_by(5.0);

        let families = Collect::collect(&registry);
        let samples = sample(&families, "http_requests_total");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 5.0);
        assert_eq!(samples[0].labels["method"], "GET");
        assert_eq!(samples[0].labels["code"], "200");
    }

    #[test]
    fn test_gauge_flattens_to_single_sample() {
        let registry = Registry::new();
        let uptime = Gauge::with_opts(Opts::new("uptime_seconds", "Uptime")).unwrap();
        registry.register(Box::new(uptime.clone())).unwrap();
        uptime.set(42.5);

        let families = Collect::collect(&registry);
        let samples = sample(&families, "uptime_seconds");
        assert_eq!(samples.len(), 1);
        assert!(samples[0].labels.is_empty());
        assert_eq!(samples[0].value, 42.5);
    }

    #[test]
    fn test_histogram_flattens_to_buckets_sum_and_count() {
        let registry = Registry::new();
        let latency = Histogram::with_opts(
            HistogramOpts::new("latency_seconds", "Latency").buckets(vec![0.1, 1.0]),
        )
        .unwrap();
        registry.register(Box::new(latency.clone())).unwrap();
        latency.observe(0.05);
        latency.observe(0.5);
        latency.observe(5.0);

        let families = Collect::collect(&registry);

        let buckets = sample(&families, "latency_seconds_bucket");
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].labels["le"], "0.1");
        assert_eq!(buckets[0].value, 1.0);
        assert_eq!(buckets[1].labels["le"], "1.0");
        assert_eq!(buckets[1].value, 2.0);
        assert_eq!(buckets[2].labels["le"], "+Inf");
        assert_eq!(buckets[2].value, 3.0);

        let sum = sample(&families, "latency_seconds_sum");
        assert_eq!(sum.len(), 1);
        assert!((sum[0].value - 5.55).abs() < 1e-9);

        let count = sample(&families, "latency_seconds_count");
        assert_eq!(count.len(), 1);
        assert_eq!(count[0].value, 3.0);
    }

    #[test]
    fn test_summary_proto_flattens_to_quantiles_sum_and_count() {
        let mut quantile = proto::Quantile::new();
        quantile.set_quantile(0.5);
        quantile.set_value(1.25);

        let mut metric = proto::Metric::new();
        let summary = metric.summary.mut_or_insert_default();
        summary.set_sample_count(7);
        summary.set_sample_sum(10.0);
        summary.quantile.push(quantile);

        let mut family = proto::MetricFamily::new();
        family.set_name("request_duration".to_string());
        family.set_type(MetricType::SUMMARY);
        family.metric.push(metric);

        let flat = flatten_family(&family);
        assert_eq!(flat.name, "request_duration");
        assert_eq!(flat.samples.len(), 3);
        assert_eq!(flat.samples[0].labels["quantile"], "0.5");
        assert_eq!(flat.samples[0].value, 1.25);
        assert_eq!(flat.samples[1].name, "request_duration_sum");
        assert_eq!(flat.samples[1].value, 10.0);
        assert_eq!(flat.samples[2].name, "request_duration_count");
        assert_eq!(flat.samples[2].value, 7.0);
    }
}
