mod common;

use common::{harness, live, test_mode};
use fleet_api_client::{ApiError, Method};
use fleet_tools::{FailureCause, Outcome};
use gateway_config_and_utils::SafetyPolicy;
use safety_gate::OperatingMode;
use serde_json::{json, Value};

/// Every mutating tool, with arguments that pass validation and explicitly
/// ask for a live run where the tool accepts it.
fn mutating_calls() -> Vec<(&'static str, Value)> {
    vec![
        ("sites_sync", json!({"site": "4", "dry_run": false})),
        ("sites_sync", json!({"confirmed": true, "dry_run": false})),
        ("sites_bulk_sync", json!({"sites": "1,2", "confirmed": true, "dry_run": false})),
        ("sites_check", json!({"site": "4"})),
        ("sites_add", json!({"url": "https://new.example", "dry_run": false})),
        ("sites_reconnect", json!({"site": "4", "dry_run": false})),
        ("sites_disconnect", json!({"site": "4", "dry_run": false})),
        ("sites_suspend", json!({"site": "4", "dry_run": false})),
        ("sites_unsuspend", json!({"site": "4", "dry_run": false})),
        ("sites_edit", json!({"site": "4", "name": "Renamed", "dry_run": false})),
        ("sites_remove", json!({"site": "4", "confirmed": true, "dry_run": false})),
        ("plugins_activate", json!({"site": "4", "plugins": "a,b", "confirmed": true, "dry_run": false})),
        ("plugins_deactivate", json!({"site": "4", "plugins": "a", "dry_run": false})),
        ("plugins_install", json!({"site": "4", "slug": "akismet", "dry_run": false})),
        ("plugins_delete", json!({"site": "4", "slug": "akismet", "dry_run": false})),
        ("themes_activate", json!({"site": "4", "theme": "astra", "dry_run": false})),
        ("themes_install", json!({"site": "4", "slug": "astra", "dry_run": false})),
        ("themes_delete", json!({"site": "4", "slug": "astra", "dry_run": false})),
        ("updates_apply", json!({"site": "4", "type": "all", "dry_run": false})),
        ("updates_apply", json!({"site": "4", "type": "plugins", "items": "a", "dry_run": false})),
        ("updates_wp", json!({"site": "4", "dry_run": false})),
        ("updates_plugins", json!({"site": "4", "plugins": "a,b", "dry_run": false})),
        ("updates_themes", json!({"site": "4", "dry_run": false})),
        ("updates_translations", json!({"site": "4", "dry_run": false})),
        ("updates_bulk_apply", json!({"type": "all", "confirmed": true, "dry_run": false})),
        ("updates_ignore", json!({"type": "plugin", "slug": "akismet"})),
        ("updates_unignore", json!({"type": "theme", "slug": "astra", "site": "4"})),
        ("clients_add", json!({"name": "Acme", "email": "ops@acme.test"})),
        ("clients_edit", json!({"client": "7", "phone": "555", "dry_run": false})),
        ("clients_delete", json!({"client": "7", "confirmed": true, "dry_run": false})),
        ("costs_add", json!({"name": "Hosting", "price": 12.5})),
        ("costs_edit", json!({"cost": "3", "price": 20.0, "dry_run": false})),
        ("costs_delete", json!({"cost": "3", "confirmed": true, "dry_run": false})),
    ]
}

#[tokio::test]
async fn test_mode_never_sends_a_mutation() {
    let h = harness(test_mode());
    h.transport
        .respond(Method::Get, "/updates/4", Ok(json!({"plugins": {"a": "2.0"}})))
        .respond(Method::Get, "/sites/basic", Ok(json!({"data": [{"id": 1}, {"id": 2}]})));

    for (tool, args) in mutating_calls() {
        let outcome = h.registry.run(tool, args.clone()).await;
        match &outcome {
            Outcome::Simulated(preview) => {
                assert_eq!(preview.mode, OperatingMode::TestMode, "{tool} {args}");
            }
            other => panic!("{tool} {args} should be simulated, got {other:?}"),
        }
        let text = outcome.render().text;
        assert!(text.starts_with("TEST MODE - "), "{tool}: {text}");
    }

    assert!(
        h.transport.mutating_requests().is_empty(),
        "mutations reached the transport: {:?}",
        h.transport.routes()
    );
}

#[tokio::test]
async fn explicit_flag_overrides_dry_run_default() {
    let h = harness(SafetyPolicy {
        dry_run_by_default: true,
        ..Default::default()
    });
    h.transport
        .respond(Method::Post, "/sites/4/suspend", Ok(json!({"success": 1})));

    let preview = h.registry.run("sites_suspend", json!({"site": "4"})).await;
    assert!(matches!(preview, Outcome::Simulated(ref p) if p.mode == OperatingMode::DryRun));
    assert!(h.transport.requests().is_empty());

    let applied = h
        .registry
        .run("sites_suspend", json!({"site": "4", "dry_run": false}))
        .await;
    assert_eq!(
        applied.payload(),
        Some(&json!({"message": "Successfully suspended site: 4", "result": {"success": 1}}))
    );
    assert_eq!(h.transport.routes(), vec!["POST /sites/4/suspend"]);
}

#[tokio::test]
async fn explicit_dry_run_previews_without_default() {
    let h = harness(live());

    let outcome = h
        .registry
        .run(
            "plugins_activate",
            json!({"site": "4", "plugins": "akismet, jetpack", "dry_run": true}),
        )
        .await;

    let text = outcome.render().text;
    assert!(text.starts_with("DRY RUN - Activate plugins on 4"));
    assert!(text.contains("Would affect 2 target(s):\n  - akismet\n  - jetpack"));
    assert!(text.ends_with("To execute this operation, set dry_run=false"));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn bulk_operations_need_confirmation_when_policy_is_on() {
    let h = harness(SafetyPolicy {
        require_bulk_confirmation: true,
        ..Default::default()
    });

    let refused = h
        .registry
        .run("plugins_activate", json!({"site": "4", "plugins": "a,b,c,d,e"}))
        .await;
    assert_eq!(
        refused.cause(),
        Some(&FailureCause::ConfirmationRequired { target_count: 5 })
    );
    assert_eq!(
        refused.render().text,
        "This operation affects 5 targets. Set confirmed=true to proceed with bulk operation."
    );

    let fleet = h.registry.run("sites_sync", json!({})).await;
    assert!(fleet.render().text.contains("affects all sites"));

    // Dry-run bulk calls are held to the same rule.
    let dry = h
        .registry
        .run("sites_bulk_sync", json!({"sites": "1,2", "dry_run": true}))
        .await;
    assert!(dry.is_error());
    assert!(h.transport.requests().is_empty());

    h.transport
        .respond(Method::Post, "/sites/4/plugins/activate", Ok(json!({"success": 1})));
    let confirmed = h
        .registry
        .run(
            "plugins_activate",
            json!({"site": "4", "plugins": "a,b", "confirmed": true, "dry_run": false}),
        )
        .await;
    assert!(!confirmed.is_error());
    let sent = h.transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, Some(json!({"plugins": "a,b"})));
}

#[tokio::test]
async fn single_target_is_never_held_for_confirmation() {
    let h = harness(SafetyPolicy {
        require_bulk_confirmation: true,
        ..Default::default()
    });
    h.transport
        .respond(Method::Post, "/sites/4/plugins/deactivate", Ok(json!({"success": 1})));

    let outcome = h
        .registry
        .run("plugins_deactivate", json!({"site": "4", "plugins": "akismet"}))
        .await;
    assert!(!outcome.is_error(), "{outcome:?}");
}

#[tokio::test]
async fn destructive_operations_require_confirmed_when_live() {
    let h = harness(live());

    let refused = h.registry.run("sites_remove", json!({"site": "4"})).await;
    assert_eq!(
        refused.render().text,
        "Removing site 4 requires confirmation. Set confirmed=true to proceed. \
         This permanently deletes all site data from MainWP."
    );
    let refused = h.registry.run("costs_delete", json!({"cost": "3"})).await;
    assert!(refused.render().text.starts_with("Deleting cost 3 requires confirmation."));
    assert!(h.transport.requests().is_empty());

    // A preview is allowed without confirmation.
    let preview = h
        .registry
        .run("clients_delete", json!({"client": "7", "dry_run": true}))
        .await;
    assert!(matches!(preview, Outcome::Simulated(_)));

    h.transport
        .respond(Method::Delete, "/sites/4", Ok(json!({"deleted": true})));
    let removed = h
        .registry
        .run("sites_remove", json!({"site": "4", "confirmed": true}))
        .await;
    assert!(!removed.is_error());
    assert_eq!(h.transport.routes(), vec!["DELETE /sites/4"]);
}

#[tokio::test]
async fn api_failures_are_prefixed_and_carry_pro_hints() {
    let h = harness(live());
    h.transport.respond(
        Method::Get,
        "/clients",
        Err(ApiError::with_status(404, "rest_no_route")),
    );

    let outcome = h.registry.run("clients_list", json!({})).await;
    assert_eq!(
        outcome.render().text,
        "Failed to list clients. This feature requires MainWP Pro with Client Reports extension.: \
         API error (404): rest_no_route"
    );
    assert_eq!(outcome.cause(), Some(&FailureCause::Api { status: Some(404) }));
}

#[tokio::test]
async fn sites_edit_requires_a_field() {
    let h = harness(live());
    let outcome = h.registry.run("sites_edit", json!({"site": "4"})).await;
    assert_eq!(outcome.cause(), Some(&FailureCause::Validation));
    assert_eq!(
        outcome.render().text,
        "At least one field (name or groupids) must be provided"
    );
}

#[tokio::test]
async fn site_check_follows_the_default_mode() {
    let h = harness(SafetyPolicy {
        dry_run_by_default: true,
        ..Default::default()
    });

    let preview = h.registry.run("sites_check", json!({"site": "4"})).await;
    assert!(matches!(preview, Outcome::Simulated(ref p) if p.mode == OperatingMode::DryRun));
    assert!(preview.render().text.starts_with("DRY RUN - Check site 4"));
    assert!(h.transport.requests().is_empty());

    let h = harness(live());
    h.transport
        .respond(Method::Post, "/sites/4/check", Ok(json!({"status": "ok"})));
    let checked = h.registry.run("sites_check", json!({"site": "4"})).await;
    assert_eq!(
        checked.payload(),
        Some(&json!({"message": "Health check completed for: 4", "result": {"status": "ok"}}))
    );
    assert_eq!(h.transport.routes(), vec!["POST /sites/4/check"]);
}
