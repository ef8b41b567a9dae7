use pretty_assertions::assert_eq;
use propgrid::{
    Archive, Field, Inspect, PointerInfo, RowKind, TreeConfig, TreeController, TreeError,
    TypeFactory, Value, statics,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn doc(text: &str) -> Value {
    Value::parse_json5(text).expect("valid JSON5")
}

fn names(c: &TreeController, path: &[&str]) -> Vec<String> {
    let tree = c.tree();
    let parent = if path.is_empty() {
        tree.root()
    } else {
        tree.find_path(path).expect("path exists")
    };
    tree.children(parent)
        .iter()
        .map(|id| tree.get(*id).expect("live child").name().to_string())
        .collect()
}

#[test]
fn rows_keep_identity_and_view_state_across_updates() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&doc("{ speed: 5.0, player: { name: 'ada', hp: 10 } }"));
    let player = c.find_path(&["player"]).ok_or("player")?;
    let hp = c.find_path(&["player", "hp"]).ok_or("hp")?;
    c.set_expanded(player, true)?;
    c.select(hp, false)?;

    let report = c.revert(&doc("{ speed: 6.0, player: { name: 'bob', hp: 3 } }"));
    assert_eq!(report.created, 0);
    assert_eq!(report.dropped, 0);

    assert_eq!(c.find_path(&["player"]), Some(player));
    assert_eq!(c.find_path(&["player", "hp"]), Some(hp));
    assert!(c.tree().row(player)?.expanded);
    assert!(c.tree().row(hp)?.selected);
    assert_eq!(c.tree().row(hp)?.value(), Some(&Value::from(3i64)));
    Ok(())
}

#[test]
fn missing_fields_are_dropped_with_their_subtree() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&doc("{ keep: 1, gone: { inner: true } }"));
    let gone = c.find_path(&["gone"]).ok_or("gone")?;
    let inner = c.find_path(&["gone", "inner"]).ok_or("inner")?;

    let report = c.revert(&doc("{ keep: 1 }"));
    assert_eq!(report.dropped, 1);
    assert!(!c.tree().contains(gone));
    assert!(!c.tree().contains(inner));
    assert!(matches!(c.tree().row(inner), Err(TreeError::StaleRow)));
    assert_eq!(names(&c, &[]), vec!["keep"]);
    Ok(())
}

#[test]
fn reordered_fields_reuse_every_row() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&doc("{ a: 1, b: 2, c: 3 }"));
    let mut before: Vec<_> = c.tree().children(c.tree().root()).to_vec();

    let report = c.revert(&doc("{ c: 3, a: 1, b: 2 }"));
    assert_eq!(report.created, 0);
    assert_eq!(report.reused, 3);
    assert_eq!(names(&c, &[]), vec!["c", "a", "b"]);

    let mut after: Vec<_> = c.tree().children(c.tree().root()).to_vec();
    before.sort();
    after.sort();
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn container_shrink_keeps_leading_elements() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    let first = c.revert(&doc("{ speed: 5.0, enabled: true, items: [1, 2, 3] }")).clone();
    assert_eq!(first.exemplars_built, 1);
    assert_eq!(names(&c, &[]), vec!["speed", "enabled", "items"]);
    assert_eq!(names(&c, &["items"]), vec!["0", "1", "2"]);
    let e0 = c.find_path(&["items", "0"]).ok_or("items.0")?;
    let e1 = c.find_path(&["items", "1"]).ok_or("items.1")?;

    let report = c.revert(&doc("{ speed: 5.0, enabled: true, items: [1, 3] }"));
    assert_eq!(report.dropped, 1);
    assert_eq!(report.exemplars_built, 0);
    assert_eq!(names(&c, &["items"]), vec!["0", "1"]);
    assert_eq!(c.find_path(&["items", "0"]), Some(e0));
    assert_eq!(c.find_path(&["items", "1"]), Some(e1));
    assert_eq!(c.tree().row(e1)?.value(), Some(&Value::from(3i64)));
    Ok(())
}

#[test]
fn declared_type_change_replaces_the_subtree() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&doc("{ slot: { x: 1 } }"));
    let slot = c.find_path(&["slot"]).ok_or("slot")?;
    let x = c.find_path(&["slot", "x"]).ok_or("x")?;

    c.revert(&doc("{ slot: [1] }"));
    let new_slot = c.find_path(&["slot"]).ok_or("slot")?;
    assert_ne!(slot, new_slot);
    assert!(!c.tree().contains(slot));
    assert!(!c.tree().contains(x));
    assert!(c.tree().row(new_slot)?.is_container());
    Ok(())
}

/// A scene with one polymorphic `shape` field.
struct Scene {
    shape: Option<(&'static str, f64)>,
}

struct Shapes;

impl TypeFactory for Shapes {
    fn concrete_types(&self) -> Vec<String> {
        vec!["Circle".to_string(), "Square".to_string()]
    }

    fn exemplar(&self, type_name: &str, ar: &mut dyn Archive) {
        let field = match type_name {
            "Circle" => "radius",
            "Square" => "side",
            _ => return,
        };
        ar.value(Field::new(field, "", "f64"), Value::from(1.0));
    }
}

impl Inspect for Scene {
    fn inspect(&self, ar: &mut dyn Archive) {
        let info = PointerInfo {
            base_type: "Shape",
            concrete: self.shape.map(|(t, _)| t),
        };
        ar.open_pointer(Field::new("shape", "Shape", "Shape"), info, &Shapes);
        if let Some((t, size)) = self.shape {
            let field = if t == "Circle" { "radius" } else { "side" };
            ar.value(Field::new(field, "", "f64"), Value::from(size));
        }
        ar.close();
    }

    fn apply(&mut self, value: &Value) -> std::result::Result<(), TreeError> {
        let shape = value
            .get("shape")
            .ok_or_else(|| TreeError::Apply("missing shape".to_string()))?;
        self.shape = match shape.get(statics::TYPE_FIELD).and_then(Value::as_str) {
            None => None,
            Some("Circle") => shape.get("radius").and_then(Value::as_f64).map(|r| ("Circle", r)),
            Some("Square") => shape.get("side").and_then(Value::as_f64).map(|s| ("Square", s)),
            Some(other) => return Err(TreeError::Apply(format!("unknown shape {other}"))),
        };
        Ok(())
    }
}

#[test]
fn pointer_exemplars_cover_every_concrete_type() -> Result<()> {
    let mut c = TreeController::new(TreeConfig::default());
    let report = c.revert(&Scene {
        shape: Some(("Circle", 2.5)),
    });
    assert_eq!(report.exemplars_built, 2);
    assert_eq!(c.exemplars().derived_types("Shape"), vec!["", "Circle", "Square"]);
    assert_eq!(names(&c, &["shape"]), vec!["radius"]);

    let again = c.revert(&Scene {
        shape: Some(("Circle", 3.0)),
    });
    assert_eq!(again.exemplars_built, 0);
    Ok(())
}

#[test]
fn switching_pointer_type_rebuilds_children_and_applies() -> Result<()> {
    let mut scene = Scene {
        shape: Some(("Circle", 2.5)),
    };
    let mut c = TreeController::new(TreeConfig::default());
    c.revert(&scene);
    let shape = c.find_path(&["shape"]).ok_or("shape")?;

    c.set_pointer_type(shape, Some("Square"))?;
    assert_eq!(names(&c, &["shape"]), vec!["side"]);
    assert!(matches!(
        &c.tree().row(shape)?.kind,
        RowKind::Pointer { concrete: Some(t), .. } if t == "Square"
    ));
    c.apply(&mut scene)?;
    assert_eq!(scene.shape, Some(("Square", 1.0)));

    c.set_pointer_type(shape, None)?;
    assert!(c.tree().children(shape).is_empty());
    c.apply(&mut scene)?;
    assert_eq!(scene.shape, None);

    assert!(matches!(
        c.set_pointer_type(shape, Some("Triangle")),
        Err(TreeError::NoExemplar(_))
    ));
    Ok(())
}

#[test]
fn malformed_traversal_is_reported_not_fatal() {
    struct Dangling;
    impl Inspect for Dangling {
        fn inspect(&self, ar: &mut dyn Archive) {
            ar.open_struct(Field::new("outer", "", "object"));
            ar.value(Field::new("", "", "i64"), Value::from(1i64));
            ar.value(Field::new("ok", "", "i64"), Value::from(2i64));
        }
        fn apply(&mut self, _value: &Value) -> std::result::Result<(), TreeError> {
            Ok(())
        }
    }

    let mut c = TreeController::new(TreeConfig::default());
    let report = c.revert(&Dangling).clone();
    assert_eq!(report.errors.len(), 2);
    assert!(matches!(report.errors[0], TreeError::EmptyName { .. }));
    assert_eq!(report.errors[1], TreeError::UnclosedComposite { open: 1 });
    assert_eq!(names(&c, &["outer"]), vec!["ok"]);
}
