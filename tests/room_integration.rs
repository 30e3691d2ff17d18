// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests: configuration, registry, aggregator and notifications.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use roomlink::config::RoomConfig;
use roomlink::device::{DeviceCommand, StatefulDevice};
use roomlink::event::EventAggregator;
use roomlink::notify::{ErrorNotificationManager, StatusMessage, WatchChannel};
use roomlink::{AppEvent, DeviceHandle, DeviceId, DeviceRegistry, PowerState, RelayIndex};
use tokio::sync::watch;

const ROOM: &str = r#"{
    "devices": [
        { "id": "display-1", "label": "Display 1",
          "capabilities": { "power": true, "inputs": 4 } },
        { "id": "display-2", "label": "Display 2",
          "capabilities": { "power": true, "inputs": 4 } },
        { "id": "lift", "label": "Screen Lift",
          "capabilities": { "relays": 2 } },
        { "id": "cam-1", "label": "Camera 1" },
        { "id": "display-1", "label": "Duplicate Display" },
        { "label": "Missing Id" }
    ],
    "notifications": { "offline_severity": 3, "offline_suffix": "offline" }
}"#;

struct Room {
    devices: Vec<Arc<StatefulDevice>>,
    aggregator: EventAggregator,
    notifier: Arc<ErrorNotificationManager>,
    display: Arc<WatchChannel>,
}

impl Room {
    fn device(&self, id: &str) -> &Arc<StatefulDevice> {
        self.devices.iter().find(|d| d.id().as_str() == id).unwrap()
    }

    fn shown(&self) -> String {
        self.display.current().to_wire()
    }
}

fn room_with_capacity(capacity: usize) -> Room {
    let config = RoomConfig::from_json_str(ROOM).unwrap();
    let (registry, devices) = DeviceRegistry::from_config(&config);
    let aggregator = EventAggregator::with_capacity(Arc::new(registry), capacity);

    let display = Arc::new(WatchChannel::new());
    let notifier = Arc::new(ErrorNotificationManager::new(
        display.clone(),
        config.notifications,
    ));

    Room {
        devices,
        aggregator,
        notifier,
        display,
    }
}

fn room() -> Room {
    room_with_capacity(256)
}

// ============================================================================
// Configuration and registry
// ============================================================================

mod startup {
    use super::*;

    #[test]
    fn bad_entries_do_not_block_the_room() {
        let room = room();
        let registry = room.aggregator.registry();

        assert_eq!(registry.len(), 4);
        assert_eq!(room.devices.len(), 4);
        assert_eq!(room.aggregator.device_label("display-1"), Some("Display 1"));

        let ids: Vec<&str> = registry.ids().map(DeviceId::as_str).collect();
        assert_eq!(ids, ["display-1", "display-2", "lift", "cam-1"]);
    }

    #[test]
    fn status_starts_idle() {
        let room = room();
        assert_eq!(room.shown(), "0:");
        assert!(room.notifier.is_idle());
    }

    #[test]
    fn reconcile_reports_devices_never_seen_online() {
        let room = room();
        room.device("display-1").set_online(true);
        room.device("lift").set_online(true);

        room.notifier.reconcile(room.aggregator.registry());

        assert_eq!(room.shown(), "3:Display 2 offline");
        let snapshot = room.notifier.snapshot();
        let pending: Vec<&str> = snapshot.pending().map(|n| n.label()).collect();
        assert_eq!(pending, ["Camera 1"]);
    }
}

// ============================================================================
// Synchronous wiring
// ============================================================================

mod attached {
    use super::*;

    #[test]
    fn offline_scenario() {
        let room = room();
        room.notifier.attach(&room.aggregator);

        for id in ["display-1", "display-2"] {
            room.device(id).set_online(true);
        }
        assert_eq!(room.shown(), "0:");

        room.device("display-1").set_online(false);
        assert_eq!(room.shown(), "3:Display 1 offline");

        room.device("display-2").set_online(false);
        assert_eq!(room.shown(), "3:Display 1 offline");
        assert_eq!(room.notifier.pending_len(), 1);

        room.device("display-1").set_online(true);
        assert_eq!(room.shown(), "3:Display 2 offline");

        room.device("display-2").set_online(true);
        assert_eq!(room.shown(), "0:");
        assert!(room.notifier.is_idle());
    }

    #[test]
    fn capability_events_do_not_touch_notices() {
        let room = room();
        room.notifier.attach(&room.aggregator);
        let mut events = room.aggregator.subscribe();

        let display = room.device("display-1");
        display.set_online(true);
        display.update_power(PowerState::On);
        room.device("lift").update_relay(RelayIndex::new(2).unwrap());

        assert!(room.notifier.is_idle());
        assert!(events.try_recv().unwrap().is_connectivity());
        assert!(matches!(
            events.try_recv().unwrap(),
            AppEvent::PowerChanged { state: PowerState::On, .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            AppEvent::RelayChanged { relay_index, .. } if relay_index.value() == 2
        ));
    }

    #[test]
    fn stalled_offline_dispatch_does_not_outlive_recovery() {
        let config = RoomConfig::from_json_str(ROOM).unwrap();
        let (registry, devices) = DeviceRegistry::from_config(&config);
        let display_1 = Arc::clone(&devices[0]);
        display_1.set_online(true);

        // Subscribed ahead of the aggregator, so it runs first and stalls the
        // offline edge while the device comes back on another thread.
        let (stalled_tx, stalled_rx) = std::sync::mpsc::channel();
        display_1.on_connectivity_changed(Box::new(move |online| {
            if !online {
                let _ = stalled_tx.send(());
                thread::sleep(Duration::from_millis(100));
            }
        }));

        let aggregator = EventAggregator::new(Arc::new(registry));
        let display = Arc::new(WatchChannel::new());
        let notifier = Arc::new(ErrorNotificationManager::new(
            display.clone(),
            config.notifications,
        ));
        notifier.attach(&aggregator);

        let dropper = {
            let device = Arc::clone(&display_1);
            thread::spawn(move || device.set_online(false))
        };
        stalled_rx.recv().unwrap();
        display_1.set_online(true);
        dropper.join().unwrap();

        assert!(aggregator.is_device_online("display-1"));
        assert_eq!(display.current().to_wire(), "0:");
        assert!(notifier.is_idle());
    }

    #[test]
    fn concurrent_flapping_keeps_display_consistent() {
        let room = room();
        room.notifier.attach(&room.aggregator);

        let threads: Vec<_> = room
            .devices
            .iter()
            .enumerate()
            .map(|(n, device)| {
                let device = Arc::clone(device);
                thread::spawn(move || {
                    for i in 0..300 {
                        device.set_online((i + n) % 2 == 0);
                    }
                    // Leave odd-numbered devices offline.
                    device.set_online(n % 2 == 0);
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let snapshot = room.notifier.snapshot();
        let mut offline: Vec<&str> = snapshot.iter().map(|n| n.device_id().as_str()).collect();
        offline.sort_unstable();
        assert_eq!(offline, ["cam-1", "display-2"]);

        let current = snapshot.current().unwrap();
        assert_eq!(room.shown(), format!("3:{} offline", current.label()));
    }
}

// ============================================================================
// Asynchronous wiring
// ============================================================================

mod listener {
    use super::*;

    async fn next_render(rx: &mut watch::Receiver<StatusMessage>) -> String {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("render timed out")
            .unwrap();
        rx.borrow_and_update().to_wire()
    }

    #[tokio::test]
    async fn listener_follows_connectivity() {
        let room = room();
        let mut shown = room.display.subscribe();
        let task = Arc::clone(&room.notifier).spawn_listener(
            Arc::clone(room.aggregator.registry()),
            room.aggregator.subscribe(),
        );

        let camera = room.device("cam-1");
        camera.set_online(true);
        camera.set_online(false);
        assert_eq!(next_render(&mut shown).await, "3:Camera 1 offline");

        camera.set_online(true);
        assert_eq!(next_render(&mut shown).await, "0:");

        let Room { aggregator, .. } = room;
        drop(aggregator);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("listener did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn lagging_listener_resyncs() {
        let room = room_with_capacity(2);
        let events = room.aggregator.subscribe();

        // Nothing runs on this runtime until the test yields, so all of these
        // are buffered before the listener polls and most are dropped.
        for device in &room.devices {
            device.set_online(true);
            device.set_online(false);
        }

        let task = Arc::clone(&room.notifier)
            .spawn_listener(Arc::clone(room.aggregator.registry()), events);

        tokio::time::timeout(Duration::from_secs(5), async {
            while room.notifier.snapshot().len() < 4 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listener did not reconcile");

        let snapshot = room.notifier.snapshot();
        let order: Vec<&str> = snapshot.iter().map(|n| n.device_id().as_str()).collect();
        assert_eq!(order, ["display-1", "display-2", "lift", "cam-1"]);
        assert_eq!(room.shown(), "3:Display 1 offline");

        task.abort();
    }

    #[tokio::test]
    async fn lagging_listener_leaves_never_seen_devices_alone() {
        let room = room_with_capacity(2);
        let events = room.aggregator.subscribe();

        for id in ["display-1", "display-2", "lift"] {
            let device = room.device(id);
            device.set_online(true);
            device.set_online(false);
        }

        let task = Arc::clone(&room.notifier)
            .spawn_listener(Arc::clone(room.aggregator.registry()), events);

        tokio::time::timeout(Duration::from_secs(5), async {
            while room.notifier.snapshot().len() < 3 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listener did not resync");

        // cam-1 never came up, so no event would have reported it either.
        let snapshot = room.notifier.snapshot();
        let order: Vec<&str> = snapshot.iter().map(|n| n.device_id().as_str()).collect();
        assert_eq!(order, ["display-1", "display-2", "lift"]);
        assert!(!snapshot.contains("cam-1"));

        task.abort();
    }
}

// ============================================================================
// Commands through the aggregator
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn driver_receives_commands_and_reports_back() {
        let room = room();
        let lift = Arc::clone(room.device("lift"));
        let mut commands = lift.attach_driver();
        lift.set_online(true);

        let driver = {
            let lift = Arc::clone(&lift);
            tokio::spawn(async move {
                while let Some(command) = commands.recv().await {
                    if let DeviceCommand::PulseRelay { index, duration } = command {
                        lift.update_relay(index);
                        tokio::time::sleep(duration).await;
                    }
                }
            })
        };

        let mut events = room.aggregator.subscribe();
        assert!(room.aggregator.pulse_relay(
            "lift",
            RelayIndex::new(2).unwrap(),
            Duration::from_secs(2)
        ));

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            AppEvent::RelayChanged {
                device_id: DeviceId::new("lift").unwrap(),
                relay_index: RelayIndex::new(2).unwrap(),
            }
        );
        assert_eq!(
            room.aggregator.active_relay("lift"),
            Some(RelayIndex::new(2).unwrap())
        );

        lift.detach_driver();
        driver.await.unwrap();
    }

    #[test]
    fn unknown_and_invalid_targets_are_rejected() {
        let room = room();
        let _commands = room.device("display-1").attach_driver();
        room.device("display-1").set_online(true);

        assert!(!room.aggregator.set_power("projector", PowerState::On));
        assert!(!room.aggregator.set_power("cam-1", PowerState::On));
        assert!(!room.aggregator.set_power("display-2", PowerState::On));
        assert!(room.aggregator.set_power("display-1", PowerState::On));

        assert!(!room.aggregator.is_device_online("projector"));
        assert_eq!(room.aggregator.power_state("projector"), None);
    }
}
