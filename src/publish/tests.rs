use std::sync::Arc;

use assert_call::{call, CallRecorder};
use parking_lot::Mutex;

use super::*;
use crate::{utils::test_helpers::ManualSpawner, Store};

#[derive(Clone, Debug, Default, PartialEq)]
struct Form {
    name: String,
    submits: u32,
}

#[derive(Clone, Debug, PartialEq)]
enum FormAction {
    SetName(String),
    Submit,
}

impl Model for Form {
    type Action = FormAction;
    type Environment = ();

    fn update(&mut self, action: FormAction, _env: &()) -> Effects<FormAction> {
        match action {
            FormAction::SetName(name) => self.name = name,
            FormAction::Submit => self.submits += 1,
        }
        Effects::none()
    }
}

#[test]
fn publisher_calls_observers_in_subscription_order() {
    let mut cr = CallRecorder::new();
    let p = Publisher::<i32, &str>::new();
    let _s0 = p.subscribe(|a, s| call!("a {a} {s}"));
    let _s1 = p.subscribe(|a, s| call!("b {a} {s}"));
    p.publish(&1, &"x");
    cr.verify(["a 1 x", "b 1 x"]);
}

#[test]
fn publisher_drops_unsubscribed_observer() {
    let mut cr = CallRecorder::new();
    let p = Publisher::<i32, ()>::new();
    let s = p.subscribe(|a, _| call!("{a}"));
    assert_eq!(p.observer_count(), 1);
    p.publish(&1, &());
    drop(s);
    assert_eq!(p.observer_count(), 0);
    p.publish(&2, &());
    cr.verify("1");
}

#[test]
fn did_update_broadcasts_after_mutation() {
    let mut cr = CallRecorder::new();
    let mut form = DidUpdate::new(Form::default());
    let _s = form.subscribe(|action, state| call!("{action:?} name={}", state.name));
    let _ = form.update(FormAction::SetName("a".into()), &());
    let _ = form.update(FormAction::SetName("a".into()), &());
    cr.verify([r#"SetName("a") name=a"#, r#"SetName("a") name=a"#]);
}

#[test]
fn did_change_skips_unchanged_state() {
    let mut cr = CallRecorder::new();
    let mut form = DidChange::new(Form::default());
    let _s = form.subscribe(|action, state| call!("{action:?} submits={}", state.submits));
    let _ = form.update(FormAction::SetName("a".into()), &());
    let _ = form.update(FormAction::SetName("a".into()), &());
    let _ = form.update(FormAction::Submit, &());
    cr.verify([r#"SetName("a") submits=0"#, "Submit submits=1"]);
}

#[test]
fn decorators_forward_reads() {
    let form = DidUpdate::new(Form {
        name: "n".into(),
        submits: 2,
    });
    assert_eq!(form.name, "n");
    assert_eq!(form.inner().submits, 2);
    assert_eq!(form.into_inner().submits, 2);

    let form = DidChange::new(Form::default());
    assert_eq!(form.submits, 0);
    assert_eq!(format!("{form:?}"), r#"DidChange(Form { name: "", submits: 0 })"#);
}

#[test]
fn store_observer_sees_new_state() {
    let store = Store::with_spawner(DidUpdate::new(Form::default()), (), ManualSpawner::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let publisher = store.with(|s| s.publisher());
    let _s = publisher.subscribe({
        let seen = seen.clone();
        move |_, state: &Form| seen.lock().push(state.name.clone())
    });
    store.send(FormAction::SetName("first".into()));
    store.send(FormAction::SetName("second".into()));
    assert_eq!(*seen.lock(), vec!["first", "second"]);
}

#[test]
fn subscription_drop_stops_broadcast_through_store() {
    let store = Store::with_spawner(DidChange::new(Form::default()), (), ManualSpawner::new());
    let count = Arc::new(Mutex::new(0));
    let s = store.with(|f| {
        let count = count.clone();
        f.subscribe(move |_, _| *count.lock() += 1)
    });
    store.send(FormAction::Submit);
    drop(s);
    store.send(FormAction::Submit);
    assert_eq!(*count.lock(), 1);
    assert_eq!(store.state().submits, 2);
}

#[test]
fn held_broadcast_runs_after_frame_with_snapshot() {
    let mut cr = CallRecorder::new();
    let mut form = DidUpdate::new(Form::default());
    let _s = form.subscribe(|action, state| call!("{action:?} name={}", state.name));
    let ((), broadcasts) = hold_broadcasts(|| {
        let _ = form.update(FormAction::SetName("a".into()), &());
        let _ = form.update(FormAction::SetName("b".into()), &());
        call!("updated");
    });
    cr.verify("updated");
    broadcasts.run();
    cr.verify([r#"SetName("a") name=a"#, r#"SetName("b") name=b"#]);
}

#[test]
fn nested_frames_hold_separately() {
    let mut cr = CallRecorder::new();
    let mut form = DidChange::new(Form::default());
    let _s = form.subscribe(|action, _| call!("{action:?}"));
    let (inner, outer) = hold_broadcasts(|| {
        let _ = form.update(FormAction::Submit, &());
        let ((), inner) = hold_broadcasts(|| {
            let _ = form.update(FormAction::SetName("x".into()), &());
        });
        inner
    });
    cr.verify(());
    inner.run();
    cr.verify(r#"SetName("x")"#);
    outer.run();
    cr.verify("Submit");
}

#[test]
fn nothing_is_held_without_observers() {
    let mut form = DidUpdate::new(Form::default());
    let ((), broadcasts) = hold_broadcasts(|| {
        let _ = form.update(FormAction::Submit, &());
    });
    assert!(broadcasts.0.is_empty());
}
