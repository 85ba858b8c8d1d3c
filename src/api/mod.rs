//! API client module for the tutor backend

pub mod catalog;
pub mod chat;
pub mod client;
pub mod practice;

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use client::TutorClient;

/// Ask a one-off question and print the answer
pub async fn ask(config: &Config, message: &str, image: Option<&Path>) -> Result<()> {
    let client = TutorClient::new(config)?;
    chat::ask(&client, message, image).await
}

/// Show backend health
pub async fn health(config: &Config) -> Result<()> {
    let client = TutorClient::new(config)?;
    catalog::health(&client).await
}

/// List the services the assistant covers
pub async fn list_services(config: &Config) -> Result<()> {
    let client = TutorClient::new(config)?;
    catalog::list_services(&client).await
}

/// Fetch a practice question and answer it on stdin
pub async fn practice(config: &Config, request: &practice::PracticeRequest) -> Result<()> {
    let client = TutorClient::new(config)?;
    practice::practice(&client, request).await
}
