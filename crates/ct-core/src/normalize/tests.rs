use super::*;
use crate::event_type::EventType;
use crate::registry::EntitySpec;
use crate::types::AbilityId;

use insta::assert_snapshot;

const PLAYER: ActorKey = ActorKey::new(1, 0);
const DREADSTALKER: u64 = 98035;
const VILEFIEND: u64 = 135_816;
const TYRANT: u64 = 135_002;
const WILD_IMP: u64 = 55659;
const FELGUARD: u64 = 17252;
const K: u64 = 900;

fn registry() -> EntityRegistry {
    EntityRegistry::new([
        EntitySpec::transient(K, "K", 5_000),
        EntitySpec::transient(DREADSTALKER, "Dreadstalker", 12_000),
        EntitySpec::transient(VILEFIEND, "Vilefiend", 15_000),
        EntitySpec::extension_trigger(TYRANT, "Demonic Tyrant", 15_000),
        EntitySpec::excluded(WILD_IMP, "Wild Imp"),
        EntitySpec::permanent(FELGUARD, "Felguard"),
    ])
    .unwrap()
}

fn summon(ts: u64, kind: u64, id: u64, instance: u32) -> Event {
    Event::new(
        ts,
        EventKind::Summon {
            entity_kind: EntityKind(kind),
        },
    )
    .by(PLAYER)
    .on(ActorKey::new(id, instance))
}

fn cast(ts: u64) -> Event {
    Event::new(
        ts,
        EventKind::Cast {
            ability: AbilityId(264_178),
        },
    )
    .by(PLAYER)
    .on(ActorKey::new(100, 1))
}

fn damage(ts: u64) -> Event {
    Event::new(
        ts,
        EventKind::Damage {
            ability: AbilityId(264_178),
            amount: 5000,
            absorbed: 0,
        },
    )
    .by(PLAYER)
    .on(ActorKey::new(100, 1))
}

fn run(events: Vec<Event>) -> NormalizeOutcome {
    run_with(events, NormalizerConfig::default())
}

fn run_with(events: Vec<Event>, config: NormalizerConfig) -> NormalizeOutcome {
    let registry = registry();
    Normalizer::new(&registry, config)
        .normalize(Trace::new(events))
        .unwrap()
}

fn despawns(trace: &Trace) -> Vec<(u64, ActorKey)> {
    trace
        .iter()
        .filter(|e| e.kind == EventKind::Despawn)
        .map(|e| (e.timestamp, e.source()))
        .collect()
}

fn render(trace: &Trace) -> String {
    trace
        .iter()
        .map(|e| format!("[{}]{e}", e.seq))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn despawn_is_inserted_before_first_later_event() {
    let outcome = run(vec![
        summon(0, K, 7, 1),
        cast(1_000),
        damage(4_000),
        cast(5_000),
        damage(6_000),
    ]);

    let types: Vec<_> = outcome
        .trace
        .iter()
        .map(|e| (e.timestamp, e.event_type()))
        .collect();
    assert_eq!(
        types,
        vec![
            (0, EventType::Summon),
            (1_000, EventType::Cast),
            (4_000, EventType::Damage),
            (5_000, EventType::Cast),
            (5_000, EventType::Despawn),
            (6_000, EventType::Damage),
        ]
    );
    assert_eq!(outcome.report.synthesized, 1);
    assert!(outcome.trace.is_normalized());
}

#[test]
fn despawn_at_trace_end_is_dropped_and_reported() {
    let outcome = run(vec![summon(0, K, 7, 1), cast(1_000), damage(1_200)]);

    assert!(despawns(&outcome.trace).is_empty());
    assert_eq!(outcome.report.synthesized, 0);
    assert_eq!(
        outcome.report.dropped,
        vec![DroppedSynthetic {
            entity: ActorKey::new(7, 1),
            timestamp: 5_000,
            trigger: EventSeq(1),
            stage: DropStage::Synthesized,
        }]
    );
}

#[test]
fn append_policy_keeps_despawn_at_trace_end() {
    let config = NormalizerConfig {
        tail_policy: TailPolicy::Append,
        ..NormalizerConfig::default()
    };
    let outcome = run_with(
        vec![summon(0, K, 7, 1), cast(1_000), damage(1_200)],
        config,
    );

    let types: Vec<_> = outcome
        .trace
        .iter()
        .map(|e| (e.timestamp, e.event_type()))
        .collect();
    assert_eq!(
        types,
        vec![
            (0, EventType::Summon),
            (1_000, EventType::Cast),
            (1_200, EventType::Damage),
            (5_000, EventType::Despawn),
        ]
    );
    assert_eq!(despawns(&outcome.trace), vec![(5_000, ActorKey::new(7, 1))]);
    assert!(outcome.report.dropped.is_empty());
}

#[test]
fn tyrant_extends_pending_despawn() {
    let outcome = run(vec![
        summon(0, DREADSTALKER, 7, 1),
        summon(10_000, TYRANT, 9, 1),
        cast(20_000),
        damage(30_000),
    ]);

    assert_snapshot!(render(&outcome.trace), @r"
    [#1]      0 summon 7.1 kind:98035
    [#2]  10000 summon 9.1 kind:135002
    [#3]  20000 cast spell:264178 -> 100.1
    [#5]  27000 despawn 7.1 (synthetic)
    [#4]  30000 damage spell:264178 -> 100.1 5000+0
    ");
    assert_eq!(outcome.report.extended, 1);
    assert_eq!(outcome.report.extension_triggers, 1);
}

#[test]
fn extension_clears_ledger() {
    // A second Tyrant must not move the already extended despawn again.
    let outcome = run(vec![
        summon(0, DREADSTALKER, 7, 1),
        summon(10_000, TYRANT, 9, 1),
        summon(25_000, TYRANT, 9, 2),
        cast(26_000),
        damage(45_000),
    ]);

    assert_eq!(despawns(&outcome.trace), vec![(27_000, ActorKey::new(7, 1))]);
    assert_eq!(outcome.report.extended, 1);
    assert_eq!(outcome.report.extension_triggers, 2);
}

#[test]
fn extension_shifts_only_future_despawns() {
    let outcome = run(vec![
        summon(0, K, 5, 1),            // fires at 5000, before the trigger
        summon(1_000, DREADSTALKER, 6, 1), // fires at 13000
        summon(2_000, VILEFIEND, 7, 1),    // fires at 17000
        summon(2_000, VILEFIEND, 7, 2),    // fires at 17000
        cast(6_000),
        summon(8_000, TYRANT, 9, 1),
        damage(60_000),
    ]);

    assert_eq!(
        despawns(&outcome.trace),
        vec![
            (5_000, ActorKey::new(5, 1)),
            (28_000, ActorKey::new(6, 1)),
            // Re-placed latest first, so the pair swaps.
            (32_000, ActorKey::new(7, 2)),
            (32_000, ActorKey::new(7, 1)),
        ]
    );
    assert_eq!(outcome.report.extended, 3);
    assert_eq!(outcome.report.stale_discarded, 1);
    assert!(outcome.trace.is_ordered());
}

#[test]
fn extension_reverses_despawns_sharing_a_time() {
    let outcome = run(vec![
        summon(2_000, VILEFIEND, 7, 1),
        summon(2_000, VILEFIEND, 7, 2),
        summon(8_000, TYRANT, 9, 1),
        damage(60_000),
    ]);

    assert_eq!(
        despawns(&outcome.trace),
        vec![(32_000, ActorKey::new(7, 2)), (32_000, ActorKey::new(7, 1))]
    );
}

#[test]
fn despawn_time_overflow_is_dropped() {
    let outcome = run(vec![summon(u64::MAX - 10, K, 7, 1), cast(u64::MAX)]);

    assert!(despawns(&outcome.trace).is_empty());
    assert_eq!(outcome.trace.len(), 2);
    assert_eq!(outcome.report.synthesized, 0);
    assert_eq!(
        outcome.report.dropped,
        vec![DroppedSynthetic {
            entity: ActorKey::new(7, 1),
            timestamp: u64::MAX,
            trigger: EventSeq(1),
            stage: DropStage::Synthesized,
        }]
    );
}

#[test]
fn extension_overflow_is_dropped() {
    let outcome = run(vec![
        summon(u64::MAX - 20_000, DREADSTALKER, 7, 1),
        summon(u64::MAX - 15_000, TYRANT, 9, 1),
        cast(u64::MAX),
    ]);

    assert!(despawns(&outcome.trace).is_empty());
    assert_eq!(outcome.report.synthesized, 1);
    assert_eq!(outcome.report.extended, 0);
    assert_eq!(outcome.report.dropped.len(), 1);
    assert_eq!(outcome.report.dropped[0].stage, DropStage::Extended);
    assert_eq!(outcome.report.dropped[0].trigger, EventSeq(1));
    assert!(outcome.trace.is_ordered());
}

#[test]
fn handled_summons_are_recognized_after_renumbering() {
    let first = run(vec![
        summon(0, DREADSTALKER, 7, 1),
        cast(1_000),
        damage(20_000),
    ]);

    // An unnumbered event ahead of the summon shifts every number by one.
    let mut events = vec![cast(0)];
    events.extend(first.trace.iter().cloned());
    let outcome = run(events);

    assert_eq!(despawns(&outcome.trace), vec![(12_000, ActorKey::new(7, 1))]);
    assert_eq!(outcome.report.synthesized, 0);
}

#[test]
fn extended_despawn_past_trace_end_is_dropped() {
    let outcome = run(vec![
        summon(0, DREADSTALKER, 7, 1),
        summon(10_000, TYRANT, 9, 1),
        damage(20_000),
    ]);

    assert!(despawns(&outcome.trace).is_empty());
    assert_eq!(outcome.report.synthesized, 1);
    assert_eq!(outcome.report.extended, 0);
    assert_eq!(outcome.report.dropped.len(), 1);
    assert_eq!(outcome.report.dropped[0].stage, DropStage::Extended);
    assert_eq!(outcome.report.dropped[0].timestamp, 27_000);
    assert_eq!(outcome.report.dropped[0].trigger, EventSeq(1));
}

#[test]
fn excluded_and_permanent_summons_are_skipped() {
    let outcome = run(vec![
        summon(0, WILD_IMP, 3, 1),
        summon(0, FELGUARD, 4, 1),
        cast(100_000),
    ]);

    assert!(despawns(&outcome.trace).is_empty());
    assert_eq!(outcome.report, NormalizeReport::default());
}

#[test]
fn unknown_kind_is_reported_without_aborting() {
    let outcome = run(vec![
        summon(0, 4242, 3, 1),
        summon(100, K, 7, 1),
        cast(10_000),
    ]);

    assert_eq!(
        outcome.report.diagnostics,
        vec![NormalizeError::MissingDuration {
            kind: EntityKind(4242),
            seq: EventSeq(1),
            timestamp: 0,
        }]
    );
    assert_eq!(despawns(&outcome.trace), vec![(5_100, ActorKey::new(7, 1))]);
}

#[test]
fn transient_without_duration_is_missing_duration() {
    let registry = EntityRegistry::new([EntitySpec {
        kind: EntityKind(K),
        name: "K".to_string(),
        category: EntityCategory::Transient,
        duration_ms: None,
    }])
    .unwrap();
    let outcome = Normalizer::new(&registry, NormalizerConfig::default())
        .normalize(Trace::new(vec![summon(0, K, 7, 1), cast(10_000)]))
        .unwrap();

    assert_eq!(outcome.report.diagnostics.len(), 1);
    assert_eq!(outcome.report.synthesized, 0);
}

#[test]
fn strict_mode_rejects_missing_duration() {
    let registry = registry();
    let config = NormalizerConfig {
        strict: true,
        ..NormalizerConfig::default()
    };
    let err = Normalizer::new(&registry, config)
        .normalize(Trace::new(vec![summon(250, 4242, 3, 1), cast(10_000)]))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "no duration registered for summoned kind:4242 (event #1 at 250ms)"
    );
}

#[test]
fn renormalizing_output_adds_nothing() {
    let registry = registry();
    let normalizer = Normalizer::new(&registry, NormalizerConfig::default());
    let events = vec![
        summon(0, DREADSTALKER, 7, 1),
        summon(3_000, VILEFIEND, 8, 1),
        summon(10_000, TYRANT, 9, 1),
        cast(20_000),
        damage(40_000),
    ];
    let first = normalizer.normalize(Trace::new(events)).unwrap();

    let second = normalizer.normalize(first.trace.clone()).unwrap();
    assert_eq!(second.trace.events(), first.trace.events());
    assert_eq!(second.report.synthesized, 0);

    // Same result when the normalized flag is lost through a file roundtrip.
    let mut buf = Vec::new();
    first.trace.write_jsonl(&mut buf, None).unwrap();
    let reloaded = Trace::from_jsonl(buf.as_slice()).unwrap();
    assert!(!reloaded.is_normalized());

    let third = normalizer.normalize(reloaded).unwrap();
    assert_eq!(third.trace.events(), first.trace.events());
    assert_eq!(third.report.synthesized, 0);
    assert_eq!(third.report.extended, 0);
}

/// Deterministic pseudo-random trace with summons, triggers and filler casts.
fn generated_trace(seed: u64, len: usize) -> Vec<Event> {
    let kinds = [K, DREADSTALKER, VILEFIEND, TYRANT, WILD_IMP, FELGUARD];
    let mut state = seed;
    let mut next = || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        state >> 33
    };

    let mut ts = 0;
    (0..len as u64)
        .map(|i| {
            ts += next() % 2_500;
            let roll = next() % 10;
            if roll < 4 {
                #[allow(clippy::cast_possible_truncation)]
                let kind = kinds[(next() % kinds.len() as u64) as usize];
                #[allow(clippy::cast_possible_truncation)]
                let instance = (next() % 3) as u32;
                summon(ts, kind, 10 + (i % 5), instance)
            } else if roll < 7 {
                cast(ts)
            } else {
                damage(ts)
            }
        })
        .collect()
}

#[test]
fn generated_traces_stay_ordered_and_account_for_every_summon() {
    let registry = registry();
    for seed in 0..50 {
        let events = generated_trace(seed, 200);
        let qualifying = events
            .iter()
            .filter(|e| {
                matches!(e.kind, EventKind::Summon { entity_kind }
                    if registry.category(entity_kind) == Some(EntityCategory::Transient))
            })
            .count();

        let outcome = Normalizer::new(&registry, NormalizerConfig::default())
            .normalize(Trace::new(events))
            .unwrap();
        let report = &outcome.report;

        assert!(outcome.trace.is_ordered(), "seed {seed} produced unordered trace");
        let dropped_at_synthesis = report
            .dropped
            .iter()
            .filter(|d| d.stage == DropStage::Synthesized)
            .count();
        assert_eq!(
            report.synthesized,
            qualifying - dropped_at_synthesis,
            "seed {seed}"
        );
        let dropped_at_extension = report.dropped.len() - dropped_at_synthesis;
        assert_eq!(
            despawns(&outcome.trace).len(),
            report.synthesized - dropped_at_extension,
            "seed {seed}"
        );
    }
}

#[test]
fn normalization_is_deterministic() {
    let registry = registry();
    let normalizer = Normalizer::new(&registry, NormalizerConfig::default());
    let a = normalizer
        .normalize(Trace::new(generated_trace(7, 300)))
        .unwrap();
    let b = normalizer
        .normalize(Trace::new(generated_trace(7, 300)))
        .unwrap();

    assert_eq!(a.trace, b.trace);
    assert_eq!(a.report, b.report);
}

#[test]
fn sessions_normalize_independently_in_parallel() {
    let registry = registry();
    let config = NormalizerConfig::default();
    let traces: Vec<_> = (0..8)
        .map(|seed| Trace::new(generated_trace(seed, 100)))
        .collect();

    let sequential: Vec<_> = traces
        .iter()
        .map(|t| {
            Normalizer::new(&registry, config.clone())
                .normalize(t.clone())
                .unwrap()
                .trace
        })
        .collect();
    let parallel: Vec<_> = normalize_sessions(traces, &registry, &config)
        .into_iter()
        .map(|r| r.unwrap().trace)
        .collect();

    assert_eq!(parallel, sequential);
}
