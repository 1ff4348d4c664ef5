//! Canonical stage outputs used by the simulator.

use crate::core::{
    CodeFile, DeploymentInfo, FileKind, Priority, StageId, Story, TestCase, TestOutcome,
};
use crate::events::StageData;

const DESIGN_DOCUMENT: &str = "# APEX Enterprise Application - System Design

## System Architecture Overview

- **API Gateway**: request routing and load balancing
- **Authentication Service**: JWT-based auth with OAuth2/OIDC support
- **File Management Service**: document storage and collaboration
- **Workflow Engine**: business process automation

## Data Model

```sql
CREATE TABLE user_stories (
  id UUID PRIMARY KEY,
  jira_id VARCHAR(50) UNIQUE NOT NULL,
  title VARCHAR(255) NOT NULL,
  priority VARCHAR(20) CHECK (priority IN ('High', 'Medium', 'Low')),
  story_points INTEGER
);
```

## Security

- AES-256 for data at rest, TLS 1.3 in transit
- Role-based access control with audit logging
";

const DEPLOYMENT_NOTES: &str =
    "Production deployment completed successfully. All services are running and monitored.";

/// The payload the simulator attaches to a stage's `content_ready` event.
#[must_use]
pub fn canonical_payload(stage: StageId) -> StageData {
    match stage {
        StageId::StoryGeneration => StageData {
            stories: Some(stories()),
            ..StageData::default()
        },
        StageId::DesignGeneration => StageData {
            design_content: Some(DESIGN_DOCUMENT.to_string()),
            ..StageData::default()
        },
        StageId::CodeGeneration => StageData {
            code_files: Some(code_files()),
            ..StageData::default()
        },
        StageId::Testing => StageData {
            test_cases: Some(test_cases()),
            ..StageData::default()
        },
        StageId::Deployment => StageData {
            deployment_info: Some(DeploymentInfo {
                environment: Some("production".to_string()),
                status: Some("deployed".to_string()),
                notes: Some(DEPLOYMENT_NOTES.to_string()),
                ..DeploymentInfo::default()
            }),
            ..StageData::default()
        },
    }
}

fn story(
    n: u32,
    title: &str,
    description: &str,
    criteria: &[&str],
    priority: Priority,
    points: u32,
) -> Story {
    Story {
        id: format!("story-{n}"),
        jira_id: format!("APEX-{}", 100 + n),
        title: title.to_string(),
        description: description.to_string(),
        acceptance_criteria: criteria.iter().map(ToString::to_string).collect(),
        priority,
        story_points: Some(points),
    }
}

fn stories() -> Vec<Story> {
    vec![
        story(
            1,
            "User Authentication & Authorization System",
            "Authentication with multi-factor support, role-based access control and secure sessions.",
            &[
                "User can register with email and password",
                "Email verification required for account activation",
                "Password reset via expiring email link",
                "Role-based access control (Admin, Manager, User, Guest)",
            ],
            Priority::High,
            13,
        ),
        story(
            2,
            "Advanced Dashboard & Analytics Platform",
            "Real-time analytics dashboard with customizable widgets and interactive charts.",
            &[
                "Real-time data visualization with auto-refresh",
                "Customizable layouts with drag-and-drop widgets",
                "Project progress tracking with milestones",
            ],
            Priority::High,
            21,
        ),
        story(
            3,
            "Enterprise File Management & Collaboration System",
            "File management with version control, collaborative editing and secure sharing.",
            &[
                "Drag-and-drop upload with resume capability",
                "Version history with rollback",
                "Permission-based sharing",
            ],
            Priority::High,
            18,
        ),
        story(
            4,
            "Workflow Automation & Process Management",
            "Design, execute and monitor business processes.",
            &[
                "Visual workflow designer",
                "Approval workflows with multi-level authorization",
                "Task assignment and notifications",
            ],
            Priority::Medium,
            16,
        ),
        story(
            5,
            "Advanced Reporting & Business Intelligence",
            "Custom report builder with scheduled generation and export.",
            &[
                "Visual query designer",
                "Scheduled report distribution",
                "Export to PDF, Excel, CSV and JSON",
            ],
            Priority::Medium,
            14,
        ),
    ]
}

fn source(id: &str, path: &str, language: &str, content: &str) -> CodeFile {
    let name = path.rsplit('/').next().unwrap_or(path);
    CodeFile {
        id: id.to_string(),
        name: name.to_string(),
        path: path.to_string(),
        kind: FileKind::File,
        size: Some(content.len() as u64),
        language: Some(language.to_string()),
        content: Some(content.to_string()),
        children: Vec::new(),
    }
}

fn directory(id: &str, path: &str, children: Vec<CodeFile>) -> CodeFile {
    let name = path.rsplit('/').next().unwrap_or(path);
    CodeFile {
        id: id.to_string(),
        name: name.to_string(),
        path: path.to_string(),
        kind: FileKind::Directory,
        children,
        ..CodeFile::default()
    }
}

fn code_files() -> Vec<CodeFile> {
    vec![
        source(
            "file-1",
            "/package.json",
            "json",
            r#"{ "name": "apex-enterprise-app", "version": "1.0.0", "scripts": { "dev": "next dev", "test": "jest" } }"#,
        ),
        directory(
            "file-2",
            "/src",
            vec![directory(
                "file-3",
                "/src/app",
                vec![
                    source(
                        "file-4",
                        "/src/app/layout.tsx",
                        "typescript",
                        "export default function RootLayout({ children }) {\n  return <html lang=\"en\"><body>{children}</body></html>\n}\n",
                    ),
                    source(
                        "file-5",
                        "/src/app/page.tsx",
                        "typescript",
                        "export default function Home() {\n  return <main>APEX Enterprise Platform</main>\n}\n",
                    ),
                ],
            )],
        ),
    ]
}

fn test_case(
    n: u32,
    name: &str,
    description: &str,
    steps: &[&str],
    expected: &str,
    priority: Priority,
) -> TestCase {
    TestCase {
        id: format!("test-{n}"),
        name: name.to_string(),
        description: description.to_string(),
        steps: steps.iter().map(ToString::to_string).collect(),
        expected_result: expected.to_string(),
        status: TestOutcome::Pass,
        priority,
    }
}

fn test_cases() -> Vec<TestCase> {
    vec![
        test_case(
            1,
            "User Authentication Flow",
            "Registration, login, verification and password reset",
            &["Register a new user", "Verify email", "Log in", "Reset password"],
            "Users can authenticate securely",
            Priority::High,
        ),
        test_case(
            2,
            "Dashboard Analytics",
            "Real-time data display and chart interactions",
            &["Open dashboard", "Verify real-time updates", "Test chart drill-down"],
            "Dashboard displays accurate real-time data",
            Priority::High,
        ),
        test_case(
            3,
            "File Management System",
            "Upload, sharing and versioning",
            &["Upload files", "Share with permissions", "Roll back a version"],
            "Files are managed with proper access controls",
            Priority::High,
        ),
        test_case(
            4,
            "Workflow Automation",
            "Workflow creation, execution and monitoring",
            &["Create template", "Execute workflow", "Check audit trail"],
            "Workflows execute with correct task assignment",
            Priority::Medium,
        ),
        test_case(
            5,
            "API Gateway Integration",
            "Authentication, rate limiting and routing at the gateway",
            &["Call with valid token", "Exceed rate limit", "Verify routing"],
            "Gateway enforces security and routes requests",
            Priority::Medium,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_stage_fills_its_own_field() {
        assert_eq!(canonical_payload(StageId::StoryGeneration).stories.map(|s| s.len()), Some(5));
        assert!(canonical_payload(StageId::DesignGeneration).design_content.is_some());
        assert!(canonical_payload(StageId::Testing).test_files.is_none());

        let deploy = canonical_payload(StageId::Deployment);
        assert!(deploy.stories.is_none());
        assert_eq!(
            deploy.deployment_info.and_then(|d| d.notes).as_deref(),
            Some(DEPLOYMENT_NOTES)
        );
    }

    #[test]
    fn test_code_tree_shape() {
        let files = code_files();
        let total: usize = files.iter().map(CodeFile::file_count).sum();
        assert_eq!(total, 3);
        assert_eq!(files[1].children[0].children[1].name, "page.tsx");
    }

    #[test]
    fn test_story_keys() {
        let keys: Vec<_> = stories().into_iter().map(|s| s.jira_id).collect();
        assert_eq!(keys, ["APEX-101", "APEX-102", "APEX-103", "APEX-104", "APEX-105"]);
    }
}
