//! Drives the pure state machine the way the orchestrator does and checks the
//! entry set stays free of duplicate hosts and names.

use chrono::Utc;

use cl_core::device::host_is_same;
use cl_core::ports::UniqueIdClaim;
use cl_core::setup::{SetupAction, SetupEvent, SetupState, SetupStateMachine};
use cl_core::{ConfigEntry, ConfigInput, DeviceClass, EntryId, SetupSettings};

/// Answers every action positively, using the bare host as device identity.
fn run(event: SetupEvent, entries: &mut Vec<ConfigEntry>) -> SetupState {
    let mut machine = SetupStateMachine::new(SetupSettings::default());
    let snapshot = entries.clone();
    let mut pending = vec![event];

    while let Some(event) = pending.pop() {
        let (_, actions) = machine.handle_event(event, &snapshot);
        for action in actions {
            match action {
                SetupAction::ValidateConnection { .. } => {
                    pending.push(SetupEvent::ConnectionValidated { valid: true })
                }
                SetupAction::ResolveUniqueId { probe } => pending.push(SetupEvent::UniqueIdResolved {
                    unique_id: Some(probe.host.clone()),
                }),
                SetupAction::ClaimUniqueId { .. } => pending.push(SetupEvent::UniqueIdClaimed {
                    outcome: UniqueIdClaim::Claimed,
                }),
                SetupAction::CreateEntry { entry } => {
                    entries.push(ConfigEntry {
                        entry_id: EntryId::new(),
                        domain: entry.domain,
                        title: entry.title,
                        unique_id: entry.unique_id,
                        data: entry.data,
                        options: entry.options,
                        created_at: Utc::now(),
                    });
                    pending.push(SetupEvent::EntryCreated { created: true });
                }
                _ => {}
            }
        }
    }

    machine.state().clone()
}

fn assert_unique(entries: &[ConfigEntry]) {
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            assert!(!host_is_same(&a.data.host, &b.data.host));
            assert_ne!(a.data.name, b.data.name);
        }
    }
}

#[test]
fn repeated_submissions_never_duplicate_hosts_or_names() {
    let submissions = [
        ("Living Room", "1.2.3.4"),
        ("Living Room", "1.2.3.5"),
        ("Kitchen", "1.2.3.4:9000"),
        ("Kitchen", "1.2.3.6"),
        ("Den", "1.2.3.6:7345"),
        ("Den", "1.2.3.7"),
    ];
    let mut entries = Vec::new();

    for (name, host) in submissions {
        let input = ConfigInput::new(name, host, DeviceClass::Speaker);
        run(SetupEvent::StartUser { input: Some(input) }, &mut entries);
        assert_unique(&entries);
    }

    let names: Vec<_> = entries.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(names, vec!["Living Room", "Kitchen", "Den"]);
}
