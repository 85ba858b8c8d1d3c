//! Supplemental backend endpoints: health and the service catalog

use anyhow::{Context, Result};

use super::client::TutorClient;
use crate::models::{HealthStatus, ServiceSummary};

/// Fetch the backend health report.
pub async fn health_data(client: &TutorClient) -> Result<HealthStatus> {
    let resp = client.get("/api/health").await?;
    resp.json()
        .await
        .context("Failed to parse health response")
}

/// Fetch the list of services the assistant knows about.
pub async fn services_data(client: &TutorClient) -> Result<Vec<ServiceSummary>> {
    let resp = client.get("/api/services").await?;
    resp.json()
        .await
        .context("Failed to parse services response")
}

/// Print backend health (prints to stdout).
pub async fn health(client: &TutorClient) -> Result<()> {
    let status = health_data(client).await?;

    println!("Backend: {}", client.base_url());
    println!("  Status: {}", status.status);
    if let Some(ref ts) = status.timestamp {
        println!("  Time:   {}", ts);
    }
    println!(
        "  Model:  {}",
        if status.gemini_available {
            "available"
        } else {
            "not configured (basic answers only)"
        }
    );
    Ok(())
}

/// Print the service catalog (prints to stdout).
pub async fn list_services(client: &TutorClient) -> Result<()> {
    let services = services_data(client).await?;

    println!("\nSupported Services:");
    println!("{:-<60}", "");

    if services.is_empty() {
        println!("  (no services)");
        return Ok(());
    }

    for service in &services {
        println!("{} [{}]", service.name, service.id);
        println!("  {}", service.description);
        if !service.subtopics.is_empty() {
            println!("  Topics: {}", service.subtopics.join(", "));
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_shape() {
        let services: Vec<ServiceSummary> = serde_json::from_str(
            r#"[{"id": "ec2", "name": "Amazon EC2", "description": "Virtual servers in the cloud",
                 "subtopics": ["launch", "AMI"]},
                {"id": "iam", "name": "AWS IAM", "description": "Identity and access management"}]"#,
        )
        .unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].subtopics, vec!["launch", "AMI"]);
        assert!(services[1].subtopics.is_empty());
    }

    #[test]
    fn test_health_shape() {
        let status: HealthStatus = serde_json::from_str(
            r#"{"status": "All good yaar!", "timestamp": "2024-05-01T10:00:00", "gemini_available": false}"#,
        )
        .unwrap();
        assert!(!status.gemini_available);
        assert_eq!(status.timestamp.as_deref(), Some("2024-05-01T10:00:00"));
    }
}
