//! Actuator lock under contention: exclusivity, FIFO order, abandoned waits

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tankbot_behaviors::{AcquireMode, ActuatorId, ActuatorLocks, LockError};

#[test]
fn test_at_most_one_holder_under_stress() {
    let locks = Arc::new(ActuatorLocks::new());
    let occupancy: Arc<[AtomicU32; 3]> = Arc::new([AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)]);
    let violations = Arc::new(AtomicU32::new(0));

    let requests: Vec<(&'static str, Vec<ActuatorId>)> = vec![
        ("remote-drive", ActuatorId::DRIVE_PAIR.to_vec()),
        ("beacon-dance", ActuatorId::DRIVE_PAIR.to_vec()),
        ("left-only", vec![ActuatorId::LeftDrive]),
        ("touch-blast", vec![ActuatorId::Accessory, ActuatorId::RightDrive]),
    ];

    let index = |id: ActuatorId| match id {
        ActuatorId::LeftDrive => 0,
        ActuatorId::RightDrive => 1,
        ActuatorId::Accessory => 2,
    };

    let handles: Vec<_> = requests
        .into_iter()
        .map(|(name, actuators)| {
            let locks = Arc::clone(&locks);
            let occupancy = Arc::clone(&occupancy);
            let violations = Arc::clone(&violations);
            thread::spawn(move || {
                for i in 0..200 {
                    let mode = if i % 3 == 0 {
                        AcquireMode::Timeout(Duration::from_millis(1))
                    } else {
                        AcquireMode::Blocking
                    };
                    let Ok(guard) = locks.acquire(&actuators, name, mode) else {
                        continue;
                    };
                    for id in &actuators {
                        if occupancy[index(*id)].fetch_add(1, Ordering::SeqCst) != 0 {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    thread::yield_now();
                    for id in &actuators {
                        occupancy[index(*id)].fetch_sub(1, Ordering::SeqCst);
                    }
                    drop(guard);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    let stats = locks.stats();
    assert_eq!(stats.acquired, stats.released);
    assert!(stats.acquired > 0);
    assert!(locks.held().is_empty());
}

#[test]
fn test_waiters_served_in_arrival_order() {
    let locks = Arc::new(ActuatorLocks::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    let holder = locks
        .acquire(&ActuatorId::DRIVE_PAIR, "holder", AcquireMode::Blocking)
        .unwrap();

    let mut handles = Vec::new();
    for name in ["first", "second", "third"] {
        let locks = Arc::clone(&locks);
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let _guard = locks
                .acquire(&ActuatorId::DRIVE_PAIR, name, AcquireMode::Blocking)
                .unwrap();
            order.lock().unwrap().push(name);
            thread::sleep(Duration::from_millis(5));
        }));
        // Give each waiter time to queue up
        thread::sleep(Duration::from_millis(50));
    }

    drop(holder);
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_abandoned_wait_unblocks_queue() {
    let locks = Arc::new(ActuatorLocks::new());
    let _left = locks
        .acquire(&[ActuatorId::LeftDrive], "holder", AcquireMode::Blocking)
        .unwrap();

    // Queued on both tracks, ahead of the right-only waiter
    let impatient = {
        let locks = Arc::clone(&locks);
        thread::spawn(move || {
            locks
                .acquire(
                    &ActuatorId::DRIVE_PAIR,
                    "impatient",
                    AcquireMode::Timeout(Duration::from_millis(100)),
                )
                .map(|_| ())
        })
    };
    thread::sleep(Duration::from_millis(20));

    let patient = {
        let locks = Arc::clone(&locks);
        thread::spawn(move || {
            let guard = locks
                .acquire(&[ActuatorId::RightDrive], "patient", AcquireMode::Blocking)
                .unwrap();
            guard.release().unwrap();
        })
    };

    assert!(matches!(impatient.join().unwrap(), Err(LockError::Busy(_))));
    // Left is still held, yet the right-only waiter must get through
    patient.join().unwrap();
    assert_eq!(locks.holder(ActuatorId::LeftDrive).as_deref(), Some("holder"));
    assert!(!locks.is_held(ActuatorId::RightDrive));
}

#[test]
fn test_non_blocking_respects_queue() {
    let locks = Arc::new(ActuatorLocks::new());
    let holder = locks
        .acquire(&[ActuatorId::Accessory], "holder", AcquireMode::Blocking)
        .unwrap();

    let waiter = {
        let locks = Arc::clone(&locks);
        thread::spawn(move || {
            let _guard = locks
                .acquire(&[ActuatorId::Accessory], "waiter", AcquireMode::Blocking)
                .unwrap();
            thread::sleep(Duration::from_millis(30));
        })
    };
    thread::sleep(Duration::from_millis(20));

    drop(holder);
    thread::sleep(Duration::from_millis(5));
    // The queued waiter owns it now; a barging request is refused
    assert!(matches!(
        locks.acquire(&[ActuatorId::Accessory], "barger", AcquireMode::NonBlocking),
        Err(LockError::Busy(_))
    ));
    waiter.join().unwrap();
}

#[test]
fn test_release_is_idempotent() {
    let locks = ActuatorLocks::new();
    let guard = locks
        .acquire(&ActuatorId::DRIVE_PAIR, "beacon-dance", AcquireMode::Blocking)
        .unwrap();
    let token = guard.token();

    assert_eq!(locks.release(&token), Ok(()));
    let before = locks.stats();
    assert_eq!(locks.release(&token), Err(LockError::AlreadyReleased));
    assert_eq!(locks.release(&token), Err(LockError::AlreadyReleased));

    let after = locks.stats();
    assert_eq!(after.released, before.released);
    assert_eq!(after.acquired, before.acquired);
    assert_eq!(after.misuse, before.misuse + 2);
    assert!(locks.held().is_empty());
    drop(guard);
    assert_eq!(locks.stats().released, before.released);
}
