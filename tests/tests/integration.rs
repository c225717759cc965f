//! All integration tests for lull

mod common;
mod end_to_end;
mod lull_hls;
mod lull_host;
