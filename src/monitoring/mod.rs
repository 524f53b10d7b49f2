/*!
 * Monitoring
 * Tracing setup and spans; counters live in `scheduler::stats`
 */

mod tracer;

pub use tracer::{init_tracing, span_cpu, span_operation, OperationSpan, ENV_TRACE_JSON};
