//! Integration tests for lull-hls over real HTTP

mod http_client;
