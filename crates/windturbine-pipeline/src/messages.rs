//! Static message templates for the two notification branches.

use windturbine_core::types::{Branch, Message};

pub const ALERT_SUBJECT: &str = "Windturbine Alert";
pub const NORMAL_SUBJECT: &str = "Windturbine Advisory";

pub fn alert_message(pipeline: &str, to: &str) -> Message {
    Message {
        to: to.to_string(),
        subject: ALERT_SUBJECT.to_string(),
        html_body: format!(
            "<h3>Temperature alert.</h3><p>Pipeline: {pipeline}</p><p>Wind turbine temperature above the limit.</p>"
        ),
    }
}

pub fn normal_message(pipeline: &str, to: &str) -> Message {
    Message {
        to: to.to_string(),
        subject: NORMAL_SUBJECT.to_string(),
        html_body: format!(
            "<h3>Normal temperatures.</h3><p>Pipeline: {pipeline}</p><p>Wind turbine temperature is normal.</p>"
        ),
    }
}

pub fn message_for(branch: Branch, pipeline: &str, to: &str) -> Message {
    match branch {
        Branch::Alert => alert_message(pipeline, to),
        Branch::Normal => normal_message(pipeline, to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        let alert = message_for(Branch::Alert, "windturbine", "ops@example.com");
        assert_eq!(alert.to, "ops@example.com");
        assert_eq!(alert.subject, "Windturbine Alert");
        assert_eq!(
            alert.html_body,
            "<h3>Temperature alert.</h3><p>Pipeline: windturbine</p><p>Wind turbine temperature above the limit.</p>"
        );

        let normal = message_for(Branch::Normal, "windturbine", "ops@example.com");
        assert_eq!(normal.subject, "Windturbine Advisory");
        assert!(normal.html_body.contains("temperature is normal"));
        assert_ne!(alert.html_body, normal.html_body);
    }
}
