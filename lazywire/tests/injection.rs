//! End-to-end behaviour of managers, entries and proxies.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use lazywire::global;
use lazywire::prelude::*;

#[derive(Debug, Default)]
struct Printer {
    indent: String,
}

impl Printer {
    fn write(&self, text: &str) -> String {
        format!("{}{text}", self.indent)
    }
}

fn make_printer(args: &Arguments) -> std::result::Result<Dependency, BoxError> {
    let indent = args.keyword::<&str>("indent").copied().unwrap_or("");
    Ok(Dependency::new(Printer {
        indent: indent.to_string(),
    }))
}

inventory::submit! { Symbol::new("tests.printer.Printer", make_printer) }

fn isolated() -> DependencyManager {
    DependencyManager::new()
}

#[test]
fn submitted_symbol_resolves_by_its_own_name() {
    let printer = isolated()
        .resolve::<Printer>("tests.printer.Printer")
        .unwrap();
    assert_eq!(printer.write("hi"), "hi");
}

#[test]
fn registered_factory_overrides_default_lookup() {
    let manager = isolated();
    manager.provider("tests.printer.Printer", Arguments::new(), |_| {
        Ok(Dependency::new(Printer {
            indent: "> ".to_string(),
        }))
    });

    let printer = manager.resolve::<Printer>("tests.printer.Printer").unwrap();
    assert_eq!(printer.write("hi"), "> hi");
}

#[test]
fn proxy_forwards_to_submitted_symbol() {
    let proxy = isolated().get_proxy("tests.printer.Printer");
    let line = proxy.with(|printer: &Printer| printer.write("x")).unwrap();
    assert_eq!(line, "x");

    assert!(matches!(
        proxy.with(|_: &String| ()),
        Err(InjectError::TypeMismatch { .. })
    ));
}

#[test]
fn lookup_with_keyword_arguments() {
    let manager = isolated();
    manager.provide(
        "indented",
        Provision::lookup("tests.printer.Printer")
            .with_args(Arguments::new().kwarg("indent", "    ")),
    );

    let printer = manager.resolve::<Printer>("indented").unwrap();
    assert_eq!(printer.write("body"), "    body");
}

#[test]
fn unresolvable_name_yields_none_without_panicking() {
    let manager = isolated();
    assert!(manager.get_entry("no.such.Thing").value().is_none());
    assert!(manager.get_entry("NoSuchBuiltin").value().is_none());
}

#[test]
fn reverse_insertion_order() {
    let manager = isolated();
    manager.provider("N", Arguments::new(), |_| Err("P1 yields nothing".into()));
    manager.provide_value("N", "X");

    let value = manager.get_entry("N").value().unwrap();
    assert_eq!(value.downcast_ref::<&str>(), Some(&"X"));
}

#[test]
fn all_values_is_computed_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let manager = isolated();
    manager.provider("svc", Arguments::new(), {
        let calls = Arc::clone(&calls);
        move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Dependency::new(1u8))
        }
    });

    let entry = manager.get_entry("svc");
    let values = entry.all_values();
    assert_eq!(values.len(), 2);
    assert!(values[0].is_none());
    assert!(values[1].is_some());

    entry.all_values();
    entry.value();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn proxy_attribute_round_trip() {
    let manager = isolated();
    manager.provide_value("settings", shared_settings());

    let proxy = manager.get_proxy("settings");
    proxy
        .with(|settings: &std::sync::Mutex<HashMap<String, i32>>| {
            settings.lock().unwrap().insert("attr".to_string(), 5);
        })
        .unwrap();

    let attr = proxy
        .with(|settings: &std::sync::Mutex<HashMap<String, i32>>| {
            settings.lock().unwrap().get("attr").copied()
        })
        .unwrap();
    assert_eq!(attr, Some(5));
}

fn shared_settings() -> std::sync::Mutex<HashMap<String, i32>> {
    std::sync::Mutex::new(HashMap::new())
}

#[test]
fn proxy_over_nothing_fails() {
    let manager = DependencyManager::builder()
        .collect_submitted(false)
        .build()
        .unwrap();
    let proxy = manager.get_proxy("tests.printer.Printer");

    assert!(matches!(
        proxy.with(|printer: &Printer| printer.write("x")),
        Err(InjectError::ProxyUnresolved { .. })
    ));
}

#[test]
fn reset_recreates_entries() {
    let manager = isolated();
    manager.provide_value("svc", 10i32);
    assert_eq!(*manager.resolve::<i32>("svc").unwrap(), 10);

    manager.reset();
    let entry = manager.get_entry("svc");
    assert_eq!(entry.provider_count(), 1);
    assert!(entry.value().is_none());
}

#[test]
fn end_to_end_map_service() {
    let manager = isolated();
    manager.provide("svc", Provision::value(HashMap::from([("a", 1)])));

    let proxy = manager.get_proxy("svc");
    let a = proxy.with(|map: &HashMap<&str, i32>| map["a"]).unwrap();
    assert_eq!(a, 1);
}

#[test]
fn global_free_functions() {
    global::provide("injection_tests.global", Provision::value(9i64));
    let value = global::dependency("injection_tests.global").value().unwrap();
    assert_eq!(value.downcast_ref::<i64>(), Some(&9));

    let printer = global::proxy("tests.printer.Printer");
    assert_eq!(printer.with(|p: &Printer| p.write("g")).unwrap(), "g");
}
