use charter::config::{GovernanceConfig, RiskControls, UsageConfig};
use charter::policy::{PolicyError, PolicyStore};

fn demo_charter() -> GovernanceConfig {
    GovernanceConfig {
        usage: UsageConfig {
            approved: vec![
                "document_categorization".to_string(),
                "analyst_support".to_string(),
            ],
            prohibited: vec!["automated_compliance_decisions".to_string()],
        },
        risk_controls: RiskControls {
            confidence_threshold: 0.7,
            human_in_the_loop: true,
        },
    }
}

#[test]
fn approved_use_case_passes() {
    let store = PolicyStore::new(demo_charter());
    assert!(store.validate_use_case("document_categorization").is_ok());
    assert!(store.validate_use_case("analyst_support").is_ok());
}

#[test]
fn prohibited_use_case_is_blocked() {
    let store = PolicyStore::new(demo_charter());
    assert_eq!(
        store.validate_use_case("automated_compliance_decisions"),
        Err(PolicyError::UseCaseProhibited {
            use_case: "automated_compliance_decisions".to_string()
        })
    );
}

#[test]
fn unlisted_use_case_is_not_approved() {
    let store = PolicyStore::new(demo_charter());
    assert_eq!(
        store.validate_use_case("market_forecasting"),
        Err(PolicyError::UseCaseNotApproved {
            use_case: "market_forecasting".to_string()
        })
    );
}

#[test]
fn risk_controls_are_exposed_verbatim() {
    let store = PolicyStore::new(demo_charter());
    assert_eq!(store.confidence_threshold(), 0.7);
    assert!(store.human_in_the_loop_required());
}
