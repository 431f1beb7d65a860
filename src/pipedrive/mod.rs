//! Pipedrive API integration module
//!
//! Provides the HTTP client, entity models and per-entity endpoint managers.

pub mod activities;
pub mod client;
pub mod deals;
pub mod item_search;
pub mod leads;
pub mod models;
pub mod organizations;
pub mod params;
pub mod persons;
pub mod utils;

pub use activities::ActivityManager;
pub use client::{ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi, PipedriveClient};
pub use deals::DealManager;
pub use item_search::ItemSearchManager;
pub use leads::LeadManager;
pub use organizations::OrganizationManager;
pub use params::{ListParams, SearchParams};
pub use persons::PersonManager;
