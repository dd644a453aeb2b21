//! HTTP request handlers for the gRNA design web service

pub mod analyze;
pub mod health;
pub mod info;
pub mod registry;
pub mod scan;
