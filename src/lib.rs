#![forbid(unsafe_code)]

pub mod config;
pub mod cubatic;
pub mod error;
pub mod grid;
pub mod pmft;
pub mod search;
pub mod simbox;
pub mod tensor;

pub use cubatic::CubaticOrderParameter;
pub use error::{OrderError, OrderResult};
pub use grid::HistogramGrid;
pub use pmft::PmftXyz;
pub use search::CellList;
pub use simbox::SimBox;
pub use tensor::Tensor4;

use tracing_subscriber::EnvFilter;

pub fn init_logging(level: Option<String>) {
    let filter = if let Some(l) = level {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(l))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_thread_ids(true)
        .try_init();
}
