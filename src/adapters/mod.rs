pub mod datadog;
pub mod healthcheck;
pub mod metrics;
pub mod share_http;
pub mod statsd;
