//! Data models for documents, line items and configuration.

pub mod config;
pub mod document;
pub mod line_item;
