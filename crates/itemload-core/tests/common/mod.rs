//! Shared fixtures for integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

pub mod http_server;
pub mod workbook;
