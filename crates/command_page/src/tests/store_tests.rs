use super::*;
use crate::test_support::command;

#[test]
fn observers_before_first_publish_receive_nothing() {
    let store = CommandStateStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = store.subscribe(move |command| {
        sink.lock().expect("seen").push(command.name.clone());
    });

    assert!(store.current().is_none());
    assert!(seen.lock().expect("seen").is_empty());

    store.publish(command("cmd/reset", "Reset"));
    assert_eq!(*seen.lock().expect("seen"), vec!["Reset".to_string()]);
}

#[test]
fn late_observer_gets_latest_value_then_updates_in_order() {
    let store = CommandStateStore::new();
    store.publish(command("cmd/a", "A"));
    store.publish(command("cmd/b", "B"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = store.subscribe(move |command| {
        sink.lock().expect("seen").push(command.name.clone());
    });
    store.publish(command("cmd/c", "C"));
    store.publish(command("cmd/d", "D"));

    assert_eq!(
        *seen.lock().expect("seen"),
        vec!["B".to_string(), "C".to_string(), "D".to_string()]
    );
}

#[test]
fn dropping_subscription_unregisters_observer() {
    let store = CommandStateStore::new();
    let (subscription, mut rx) = store.subscribe_channel();
    assert_eq!(store.observer_count(), 1);

    store.publish(command("cmd/a", "A"));
    subscription.unsubscribe();
    assert_eq!(store.observer_count(), 0);
    store.publish(command("cmd/b", "B"));

    assert_eq!(rx.try_recv().expect("first").name, "A");
    assert!(rx.try_recv().is_err());
}

#[test]
fn observer_may_read_current_value_during_delivery() {
    let store = CommandStateStore::new();
    let reader = store.clone();
    let consistent = Arc::new(Mutex::new(true));
    let flag = Arc::clone(&consistent);
    let _subscription = store.subscribe(move |command| {
        let current = reader.current().expect("current during delivery");
        if !Arc::ptr_eq(&current, command) {
            *flag.lock().expect("flag") = false;
        }
    });

    store.publish(command("cmd/a", "A"));
    store.publish(command("cmd/b", "B"));
    assert!(*consistent.lock().expect("flag"));
}

#[test]
fn identical_republish_still_notifies() {
    let store = CommandStateStore::new();
    let (_subscription, mut rx) = store.subscribe_channel();
    store.publish(command("cmd/a", "A"));
    store.publish(command("cmd/a", "A"));

    let first = rx.try_recv().expect("first");
    let second = rx.try_recv().expect("second");
    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn observer_may_subscribe_during_delivery() {
    let store = CommandStateStore::new();
    let nested = Arc::new(Mutex::new(Vec::new()));
    let subscriptions = Arc::new(Mutex::new(Vec::new()));
    let registrar = store.clone();
    let sink = Arc::clone(&nested);
    let held = Arc::clone(&subscriptions);
    let _subscription = store.subscribe(move |command| {
        let sink = Arc::clone(&sink);
        let inner = registrar.subscribe(move |seen| {
            sink.lock().expect("nested").push(seen.name.clone());
        });
        held.lock().expect("held").push(inner);
        assert_eq!(command.name, registrar.current().expect("current").name);
    });

    store.publish(command("cmd/a", "A"));
    assert_eq!(store.observer_count(), 2);
    assert_eq!(*nested.lock().expect("nested"), vec!["A".to_string()]);

    // The nested observer registered during the first delivery sees the next
    // value once; the outer observer then registers another nested one.
    store.publish(command("cmd/b", "B"));
    assert_eq!(store.observer_count(), 3);
    assert_eq!(
        *nested.lock().expect("nested"),
        vec!["A".to_string(), "B".to_string(), "B".to_string()]
    );
}

#[test]
fn observer_may_subscribe_from_initial_delivery() {
    let store = CommandStateStore::new();
    store.publish(command("cmd/a", "A"));

    let registrar = store.clone();
    let inner = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&inner);
    let _subscription = store.subscribe(move |_| {
        let nested = registrar.subscribe(|_| {});
        *slot.lock().expect("slot") = Some(nested);
    });

    assert_eq!(store.observer_count(), 2);
    assert!(inner.lock().expect("slot").is_some());
}
