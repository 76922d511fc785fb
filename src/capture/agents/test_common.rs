//! Shared contract tests for agent implementations.
//!
//! These run against [`default_registry`] so every registered agent is held
//! to the same interface expectations. Format-specific parsing tests stay
//! in each agent's module.

use super::*;
use tempfile::TempDir;

/// Every agent has a non-empty name and description.
#[test]
fn test_all_agents_have_valid_info() {
    let registry = default_registry();
    let agents = registry.all();

    assert!(!agents.is_empty(), "Default registry should have agents");

    for agent in agents {
        let info = agent.info();
        assert!(!info.name.is_empty(), "Agent name should not be empty");
        assert!(
            !info.description.is_empty(),
            "Agent {} description should not be empty",
            info.name
        );
    }
}

/// Registry keys match the names agents report.
#[test]
fn test_registry_keys_match_agent_names() {
    let registry = default_registry();
    for name in registry.names() {
        assert_eq!(registry.get(name).unwrap().info().name, name);
    }
}

/// Looking up an unregistered agent is an explicit error.
#[test]
fn test_get_unknown_agent() {
    let registry = default_registry();
    assert!(matches!(
        registry.get("no-such-agent"),
        Err(Error::UnknownAgent(_))
    ));
}

/// Session paths are non-empty and transcripts live inside them.
#[test]
fn test_all_agents_session_paths_are_valid() {
    let registry = default_registry();
    let repo = Path::new("/tmp/some/repo");

    for agent in registry.all() {
        let paths = agent.session_paths(repo);
        assert!(
            !paths.session_dir.as_os_str().is_empty(),
            "Agent {} returned empty session dir",
            agent.info().name
        );
        assert!(!paths.pattern.is_empty());
        assert!(agent
            .transcript_path("abc", repo)
            .starts_with(&paths.session_dir));
    }
}

/// Detection on a directory no agent has seen fails cleanly.
#[test]
fn test_detect_any_on_unknown_repo() {
    let registry = default_registry();
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("never-used-by-any-agent");
    assert!(registry.detect_any(&repo).is_none());
}

/// The expected agents are registered.
#[test]
fn test_default_registry_contains_expected_agents() {
    let registry = default_registry();
    for name in ["claude-code"] {
        assert!(
            registry.get(name).is_ok(),
            "Expected agent '{}' not found in default registry",
            name
        );
    }
}
