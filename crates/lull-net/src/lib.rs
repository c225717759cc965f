#![forbid(unsafe_code)]

mod client;
mod error;
mod retry;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    retry::fetch_with_retry,
    traits::Net,
    types::{NetOptions, RetryPolicy},
};
