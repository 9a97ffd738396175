use super::*;

#[test]
fn sort_is_by_tier_and_stable_within_a_tier() {
    let mut items = vec![
        ("scratch", StageTier::Advanced),
        ("noise", StageTier::Basic),
        ("aliasing", StageTier::Intermediate),
        ("blur", StageTier::Basic),
        ("dirt", StageTier::Advanced),
    ];
    canonical_order(&mut items, |(_, tier)| *tier);
    let ids = items.iter().map(|(id, _)| *id).collect::<Vec<_>>();
    assert_eq!(ids, ["noise", "blur", "aliasing", "scratch", "dirt"]);
}

#[test]
fn groups_cover_every_operation_once() {
    let registry = OperationRegistry::builtin();
    let groups = group_by_tier(&registry);
    assert_eq!(
        groups.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
        StageTier::ALL
    );
    let total: usize = groups.iter().map(|(_, ds)| ds.len()).sum();
    assert_eq!(total, registry.len());
    assert!(
        groups
            .iter()
            .all(|(tier, ds)| ds.iter().all(|d| d.stage_tier == *tier))
    );
}
