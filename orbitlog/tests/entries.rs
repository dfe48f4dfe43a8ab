//! Entry creation and verification across peers.

use orbitlog::{
    Clock, EncodedEntry, Entry, Identities, Identity, ProviderRegistry, PublicKeyProvider,
    SecretKey, new_entry, new_entry_with_links, verify_entry_signature,
};
use orbitlog_identity::FixedKey;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;

fn seeded(seed: u64) -> (ProviderRegistry, Identity) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    let key = SecretKey::generate(&mut rng);
    let registry = ProviderRegistry::new();
    registry
        .register(PublicKeyProvider::with_key_source(FixedKey::new(key)))
        .unwrap();
    let identity = Identities::new(&registry, PublicKeyProvider::TYPE)
        .unwrap()
        .create_identity("alice")
        .unwrap();
    (registry, identity)
}

#[test]
fn alice_writes_and_bob_verifies() {
    let registry = ProviderRegistry::with_defaults();
    let identities = Identities::new(&registry, "publickey").unwrap();
    let alice = identities.create_identity("alice").unwrap();
    assert!(identities.verify_identity(&alice));

    let entry = new_entry(&registry, &alice, "log", "hello", Clock::new("alice", 1)).unwrap();
    assert!(verify_entry_signature(&registry, &alice, &entry));

    // bob only receives the bytes of the identity and of the entry
    let bob_registry = ProviderRegistry::with_defaults();
    let received_identity = Identity::decode(alice.bytes()).unwrap();
    let received_entry = EncodedEntry::decode(entry.bytes()).unwrap();
    assert_eq!(received_entry.identity, received_identity.hash());
    assert_eq!(received_entry.cid(), entry.cid());
    assert!(verify_entry_signature(
        &bob_registry,
        &received_identity,
        &received_entry
    ));
}

#[test]
fn unrelated_signature_is_rejected() {
    let (registry, alice) = seeded(0);
    let entry = new_entry(&registry, &alice, "log", "hello", Clock::new("alice", 1)).unwrap();

    let unrelated = alice.private_key().unwrap().sign(b"something else").unwrap();
    let forged = EncodedEntry::encode(Entry {
        signature: unrelated.to_hex(),
        ..entry.entry().clone()
    })
    .unwrap();

    assert!(!verify_entry_signature(&registry, &alice, &forged));
    assert_ne!(forged.cid(), entry.cid());
}

#[test]
fn entry_of_another_identity_is_rejected() {
    let (registry, alice) = seeded(1);
    let (_, mallory) = seeded(2);
    let entry = new_entry(&registry, &alice, "log", "hello", Clock::new("alice", 1)).unwrap();
    assert!(!verify_entry_signature(&registry, &mallory, &entry));
}

#[test]
fn unregistered_provider_fails_closed() {
    let (registry, alice) = seeded(3);
    let entry = new_entry(&registry, &alice, "log", "hello", Clock::new("alice", 1)).unwrap();
    assert!(!verify_entry_signature(
        &ProviderRegistry::new(),
        &alice,
        &entry
    ));
}

#[test]
fn chain_of_entries() {
    let (registry, alice) = seeded(4);
    let mut clock = Clock::new(alice.public_key(), 1);
    let mut heads: Vec<String> = Vec::new();
    let mut entries = Vec::new();
    for payload in ["one", "two", "three"] {
        let entry = new_entry_with_links(
            &registry,
            &alice,
            "log",
            payload,
            clock.clone(),
            heads.clone(),
            Vec::new(),
        )
        .unwrap();
        heads = vec![entry.hash()];
        clock = clock.tick().unwrap();
        entries.push(entry);
    }

    assert!(entries[0].next.is_empty());
    assert_eq!(entries[1].next, [entries[0].hash()]);
    assert_eq!(entries[2].next, [entries[1].hash()]);
    assert_eq!(entries[2].clock.time, 3);
    assert!(
        entries
            .iter()
            .all(|entry| verify_entry_signature(&registry, &alice, entry))
    );
}

proptest! {
    #[test]
    fn tampering_is_detected(payload in ".{0,32}", time in 1u64..1_000, field in 0usize..3) {
        let (registry, alice) = seeded(5);
        let entry = new_entry(&registry, &alice, "log", payload.clone(), Clock::new("alice", time)).unwrap();
        prop_assert!(verify_entry_signature(&registry, &alice, &entry));

        let mut tampered = entry.entry().clone();
        match field {
            0 => tampered.payload.push('!'),
            1 => tampered.key = SecretKey::generate(&mut rand_chacha::ChaCha8Rng::seed_from_u64(7)).public().to_hex(),
            _ => tampered.clock.time += 1,
        }
        let tampered = EncodedEntry::encode(tampered).unwrap();
        prop_assert!(!verify_entry_signature(&registry, &alice, &tampered));
        prop_assert_ne!(tampered.cid(), entry.cid());
    }

    #[test]
    fn encoding_is_deterministic(payload in ".{0,64}", time in any::<u64>()) {
        let (registry, alice) = seeded(6);
        let entry = new_entry(&registry, &alice, "log", payload, Clock::new("alice", time)).unwrap();
        let again = EncodedEntry::encode(entry.entry().clone()).unwrap();
        prop_assert_eq!(again.bytes(), entry.bytes());
        prop_assert_eq!(again.cid(), entry.cid());
    }

    #[test]
    fn any_entry_survives_the_wire(entry in arb_entry()) {
        let encoded = EncodedEntry::encode(entry.clone()).unwrap();
        let decoded = EncodedEntry::decode(encoded.bytes()).unwrap();
        prop_assert_eq!(decoded.entry(), &entry);
        prop_assert_eq!(decoded.bytes(), encoded.bytes());
        prop_assert_eq!(decoded.cid(), encoded.cid());
    }
}

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        (any::<String>(), any::<String>()),
        (
            prop::collection::vec(any::<String>(), 0..4),
            prop::collection::vec(any::<String>(), 0..4),
        ),
        (any::<String>(), any::<u64>()),
        (any::<u64>(), any::<String>(), any::<String>(), any::<String>()),
    )
        .prop_map(
            |((id, payload), (next, refs), (clock_id, time), (version, key, identity, signature))| {
                Entry {
                    id,
                    payload,
                    next,
                    refs,
                    clock: Clock::new(clock_id, time),
                    version,
                    key,
                    identity,
                    signature,
                }
            },
        )
}
