use pretty_assertions::assert_eq;
use propgrid::{
    Archive, ContainerInfo, Field, Inspect, RowId, TreeConfig, TreeController, TreeError, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn controller(text: &str) -> Result<(TreeController, Value)> {
    let value = Value::parse_json5(text)?;
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&value);
    Ok((c, value))
}

fn element_names(c: &TreeController, container: RowId) -> Vec<String> {
    c.tree()
        .children(container)
        .iter()
        .filter_map(|id| c.tree().get(*id))
        .map(|r| r.name().to_string())
        .collect()
}

#[test]
fn add_element_appends_a_default_copy() -> Result<()> {
    let (mut c, mut value) = controller("{ items: [4, 5] }")?;
    let items = c.find_path(&["items"]).ok_or("items")?;

    let added = c.add_element(items)?;
    assert_eq!(element_names(&c, items), vec!["0", "1", "2"]);
    assert_eq!(c.tree().row(added)?.label(), "2");
    assert!(c.tree().is_attached(added));

    c.apply(&mut value)?;
    assert_eq!(value, Value::parse_json5("{ items: [4, 5, 0] }")?);
    Ok(())
}

#[test]
fn remove_element_renumbers_the_rest() -> Result<()> {
    let (mut c, mut value) = controller("{ items: ['a', 'b', 'c'] }")?;
    let items = c.find_path(&["items"]).ok_or("items")?;
    let last = c.find_path(&["items", "2"]).ok_or("items.2")?;

    c.remove_element(items, 0)?;
    assert_eq!(element_names(&c, items), vec!["0", "1"]);
    assert_eq!(c.find_path(&["items", "1"]), Some(last));
    assert_eq!(c.tree().row(last)?.label(), "1");

    c.apply(&mut value)?;
    assert_eq!(value, Value::parse_json5("{ items: ['b', 'c'] }")?);

    assert!(matches!(
        c.remove_element(items, 5),
        Err(TreeError::IndexOutOfRange { index: 5, len: 2, .. })
    ));
    Ok(())
}

/// A tuning struct whose history list is shown read-only.
struct Tuning;

impl Inspect for Tuning {
    fn inspect(&self, ar: &mut dyn Archive) {
        ar.value(Field::new("speed", "", "f64"), Value::from(1.0));
        let info = ContainerInfo {
            element_type: "i64",
            len: 1,
            fixed_size: false,
        };
        let mut exemplar =
            |ar: &mut dyn Archive| ar.value(Field::new("0", "", "i64"), Value::from(0i64));
        ar.open_container(Field::new("history", "!History", "array"), info, &mut exemplar);
        ar.value(Field::new("0", "", "i64"), Value::from(1i64));
        ar.close();
    }

    fn apply(&mut self, _value: &Value) -> std::result::Result<(), TreeError> {
        Ok(())
    }
}

#[test]
fn structural_edits_need_an_editable_container() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&Tuning);
    let speed = c.find_path(&["speed"]).ok_or("speed")?;
    let history = c.find_path(&["history"]).ok_or("history")?;
    assert!(matches!(
        c.add_element(speed),
        Err(TreeError::WrongKind { expected: "container", .. })
    ));
    assert!(matches!(c.add_element(history), Err(TreeError::ReadOnly(_))));
    assert_eq!(c.tree().children(history).len(), 1);
    Ok(())
}

#[test]
fn expand_all_notifies_once() -> Result<()> {
    let (mut c, _) = controller("{ a: { b: { c: 1 } }, d: [1], e: 2 }")?;
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    c.set_listener(Some(Box::new(move |rows: &[RowId]| {
        sink.borrow_mut().push(rows.len())
    })));

    c.expand_all();
    assert_eq!(*calls.borrow(), vec![3]);
    let composites: [&[&str]; 3] = [&["a"], &["a", "b"], &["d"]];
    for path in composites {
        let id = c.find_path(path).ok_or("row")?;
        assert!(c.tree().row(id)?.expanded, "{path:?}");
    }

    c.collapse_all();
    let a = c.find_path(&["a"]).ok_or("a")?;
    assert!(!c.tree().row(a)?.expanded);
    assert_eq!(calls.borrow().len(), 2);
    Ok(())
}

#[test]
fn toggle_reports_the_new_state() -> Result<()> {
    let (mut c, _) = controller("{ s: { x: 1 } }")?;
    let s = c.find_path(&["s"]).ok_or("s")?;
    assert!(c.toggle_expanded(s)?);
    assert!(!c.toggle_expanded(s)?);
    Ok(())
}

#[test]
fn editor_keeps_a_dropped_row_alive_until_released() -> Result<()> {
    let (mut c, _) = controller("{ a: 1, b: 2 }")?;
    let a = c.find_path(&["a"]).ok_or("a")?;
    c.attach_editor(a, Some(Rc::new(|_: RowId, _: &Value| {})))?;

    c.revert(&Value::parse_json5("{ b: 2 }")?);
    assert!(c.tree().contains(a));
    assert!(!c.tree().is_attached(a));

    c.attach_editor(a, None)?;
    assert!(!c.tree().contains(a));
    Ok(())
}

#[test]
fn update_lock_is_released_by_the_outermost_end() -> Result<()> {
    let (mut c, _) = controller("{ a: 1 }")?;
    let a = c.find_path(&["a"]).ok_or("a")?;
    let seen = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&seen);
    c.set_listener(Some(Box::new(move |_: &[RowId]| *sink.borrow_mut() += 1)));

    c.begin_update();
    c.begin_update();
    c.set_value(a, Value::from(2i64))?;
    c.end_update();
    assert!(c.is_updating());
    assert_eq!(*seen.borrow(), 0);
    c.end_update();
    assert!(!c.is_updating());
    assert_eq!(*seen.borrow(), 1);

    // An unmatched end is ignored.
    c.end_update();
    assert_eq!(*seen.borrow(), 1);
    Ok(())
}
