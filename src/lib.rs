//! Pipedrive MCP Server Library
//!
//! A Model Context Protocol (MCP) server for the Pipedrive CRM.
//! Provides tools for managing activities, deals, leads, organizations and
//! persons, plus cross-entity item search, via the Pipedrive REST API.

pub mod config;
pub mod error;
pub mod features;
pub mod mcp;
pub mod pipedrive;

pub use config::Config;
pub use error::{PipedriveMcpError, Result};
