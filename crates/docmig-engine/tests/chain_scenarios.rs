use docmig_engine::{
    declared_version, migrate_node, Condition, Defaults, MigrationChain, MigrationError,
    MigrationStep, PatchEngine, PatchRule, StepContext,
};
use docmig_test_utils::{assert_yaml_eq, emit, parse, str_at, version};
use docmig_tree::{Node, NodePath, Placement};
use proptest::prelude::*;

const V1: &[u8] = b"version: 0.0.1\nsettings:\n  timeout: 30\n  endpoint: http://localhost:8545\n";
const V2: &[u8] = b"version: 0.0.2\nsettings:\n  timeout: 60\n  endpoint: http://localhost:8545\n";
const V3: &[u8] =
    b"version: 0.0.3\nsettings:\n  timeout: 60\n  endpoint: http://127.0.0.1:8545\n  retries: 3\n";

fn one_to_two(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    PatchEngine::new(&defaults.old, &defaults.new)
        .adopt(NodePath::literal("settings.timeout"), Condition::IfUnchanged)
        .apply(user)?;
    Ok(())
}

fn two_to_three(
    user: &mut Node,
    defaults: &Defaults,
    _: &StepContext,
) -> Result<(), MigrationError> {
    PatchEngine::new(&defaults.old, &defaults.new)
        .adopt(NodePath::literal("settings.endpoint"), Condition::Always)
        .adopt_placed(
            NodePath::literal("settings.retries"),
            Condition::IfMissing,
            Placement::after("timeout"),
        )
        .apply(user)?;
    Ok(())
}

fn chain() -> MigrationChain {
    MigrationChain::new(vec![
        MigrationStep::new(version("0.0.1"), version("0.0.2"), V1, V2, one_to_two),
        MigrationStep::new(version("0.0.2"), version("0.0.3"), V2, V3, two_to_three),
    ])
    .unwrap()
}

fn migrate(user: &mut Node, from: &str, to: &str) -> Result<(), MigrationError> {
    migrate_node(user, version(from), version(to), &chain(), &StepContext::new()).map(|_| ())
}

#[test]
fn whole_chain_equals_steps_applied_one_by_one() {
    let original = parse(
        "version: 0.0.1\nsettings:\n  # seconds\n  timeout: 30\n  endpoint: http://localhost:8545\n\
         \x20 custom: kept\n",
    );

    let mut direct = original.clone();
    migrate(&mut direct, "0.0.1", "0.0.3").unwrap();

    let mut stepwise = original;
    migrate(&mut stepwise, "0.0.1", "0.0.2").unwrap();
    migrate(&mut stepwise, "0.0.2", "0.0.3").unwrap();

    assert_eq!(emit(&direct), emit(&stepwise));
    assert_yaml_eq(
        &direct,
        "version: 0.0.3\nsettings:\n  # seconds\n  timeout: 60\n  retries: 3\n\
         \x20 endpoint: http://127.0.0.1:8545\n  custom: kept\n",
    );
}

#[test]
fn customized_value_survives_if_unchanged() {
    let mut user =
        parse("version: 0.0.1\nsettings:\n  timeout: 45\n  endpoint: http://localhost:8545\n");
    migrate(&mut user, "0.0.1", "0.0.3").unwrap();
    assert_eq!(str_at(&user, "settings.timeout"), Some("45"));
}

#[test]
fn always_rule_overrides_customization() {
    let mut user =
        parse("version: 0.0.2\nsettings:\n  timeout: 60\n  endpoint: http://my-node:8545\n");
    migrate(&mut user, "0.0.2", "0.0.3").unwrap();
    assert_eq!(str_at(&user, "settings.endpoint"), Some("http://127.0.0.1:8545"));
}

#[test]
fn terminal_version_is_idempotent() {
    let mut user = parse("version: 0.0.1\nsettings:\n  timeout: 30\n");
    let latest = chain().latest().unwrap();
    migrate_node(&mut user, version("0.0.1"), latest, &chain(), &StepContext::new()).unwrap();

    let before = emit(&user);
    let from = declared_version(&user).unwrap();
    let err = migrate_node(&mut user, from, latest, &chain(), &StepContext::new()).unwrap_err();
    assert!(err.is_up_to_date());
    assert_eq!(emit(&user), before);
}

#[test]
fn rule_on_scalar_parent_aborts_the_chain() {
    fn broken(
        user: &mut Node,
        defaults: &Defaults,
        _: &StepContext,
    ) -> Result<(), MigrationError> {
        PatchEngine::new(&defaults.old, &defaults.new)
            .rule(PatchRule::set(
                NodePath::literal("settings.timeout.unit"),
                Condition::Always,
                Node::scalar("s"),
            ))
            .apply(user)?;
        Ok(())
    }
    let chain = MigrationChain::new(vec![
        MigrationStep::new(version("0.0.1"), version("0.0.2"), V1, V2, one_to_two),
        MigrationStep::new(version("0.0.2"), version("0.0.3"), V2, V3, broken),
    ])
    .unwrap();
    let mut user = parse("version: 0.0.1\nsettings:\n  timeout: 30\n");
    let (from, to) = (version("0.0.1"), version("0.0.3"));
    let err = migrate_node(&mut user, from, to, &chain, &StepContext::new()).unwrap_err();
    assert!(matches!(err, MigrationError::StructuralMismatch { .. }));
    assert_eq!(str_at(&user, "version"), Some("0.0.1"));
}

proptest! {
    #[test]
    fn timeout_is_kept_unless_it_was_the_old_default(timeout in 1u32..200) {
        let mut user = parse(&format!("version: 0.0.1\nsettings:\n  timeout: {timeout}\n"));
        migrate(&mut user, "0.0.1", "0.0.2").unwrap();
        let expected = if timeout == 30 { "60".to_string() } else { timeout.to_string() };
        prop_assert_eq!(str_at(&user, "settings.timeout"), Some(expected.as_str()));
    }
}
