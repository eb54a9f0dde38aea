use prometheus_exporter::prometheus::{
    HistogramTimer, HistogramVec, IntCounterVec, default_registry,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
};

pub fn create_int_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    let registry = default_registry();
    register_int_counter_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int counter vec")
}

pub fn inc_counter_vec(counter_vec: &IntCounterVec, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc();
}

pub fn create_histogram_vec(name: &str, help: &str, label_names: &[&str]) -> HistogramVec {
    let registry = default_registry();
    register_histogram_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create histogram")
}

pub fn start_timer_vec(histogram_vec: &HistogramVec, label_values: &[&str]) -> HistogramTimer {
    histogram_vec.with_label_values(label_values).start_timer()
}

pub fn stop_timer(timer: HistogramTimer) {
    timer.observe_duration()
}
