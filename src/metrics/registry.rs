use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Error Metrics
    pub static ref API_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "api_errors_total",
        "Total error responses rendered by the exception filter",
        &["code", "status"]
    )
    .unwrap();

    // Database Metrics
    pub static ref DATABASE_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "database_queries_total",
        "Total database queries",
        &["query_type"]  // query_type: select, insert, update
    )
    .unwrap();

    pub static ref DATABASE_QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "database_query_duration_seconds",
        "Database query duration in seconds",
        &["query_type"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref USERS_TOTAL: IntGauge = register_int_gauge!(
        "users_total",
        "Total number of users in database"
    )
    .unwrap();

    pub static ref USERS_REGISTERED_TOTAL: IntCounter = register_int_counter!(
        "users_registered_total",
        "Total users registered since start"
    )
    .unwrap();

    pub static ref SIGN_IN_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sign_in_attempts_total",
        "Total sign-in attempts",
        &["outcome"]  // outcome: success, bad_credentials, locked
    )
    .unwrap();
}

/// Initialize all metrics (called on startup)
pub fn init_metrics() {
    // Force lazy_static initialization
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&HTTP_REQUEST_DURATION_SECONDS);
    lazy_static::initialize(&API_ERRORS_TOTAL);
    lazy_static::initialize(&DATABASE_QUERIES_TOTAL);
    lazy_static::initialize(&DATABASE_QUERY_DURATION_SECONDS);
    lazy_static::initialize(&USERS_TOTAL);
    lazy_static::initialize(&USERS_REGISTERED_TOTAL);
    lazy_static::initialize(&SIGN_IN_ATTEMPTS_TOTAL);
}
