pub mod helpers;

use helpers::{create_histogram_vec, create_int_counter_vec};
use prometheus_exporter::prometheus::{HistogramVec, IntCounterVec};

lazy_static::lazy_static! {
    pub static ref ENGINE_API_REQUEST_TIME: HistogramVec = create_histogram_vec(
        "keel_engine_api_request_time",
        "Duration of engine API requests by method",
        &["method"]
    );

    pub static ref PAYLOAD_ID_CACHE_HIT: IntCounterVec = create_int_counter_vec(
        "keel_payload_id_cache_hit",
        "Number of payload ID cache hits during block building",
        &[]
    );

    pub static ref PAYLOAD_ID_CACHE_MISS: IntCounterVec = create_int_counter_vec(
        "keel_payload_id_cache_miss",
        "Number of payload ID cache misses during block building",
        &[]
    );

    pub static ref GET_PAYLOAD_ERROR: IntCounterVec = create_int_counter_vec(
        "keel_get_payload_error",
        "Number of failed engine_getPayload calls during block building",
        &[]
    );

    pub static ref NIL_PAYLOAD_ID: IntCounterVec = create_int_counter_vec(
        "keel_nil_payload_id",
        "Number of forkchoice updates that returned no payload ID when one was requested",
        &[]
    );

    pub static ref FORKCHOICE_STATUS: IntCounterVec = create_int_counter_vec(
        "keel_forkchoice_status",
        "Forkchoice update responses by payload status",
        &["status"]
    );
}
