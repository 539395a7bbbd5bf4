use deltadoc::{
    Document, DocumentStore, Entry, Registry, StoreConfig, Value, array, document,
    value::{ObjectId, Timestamp},
};

fn inventory() -> Document {
    document! {
        "id" => Value::ObjectId(ObjectId::new([0x42; 12])),
        "name" => "widget",
        "stocked" => Value::Timestamp(Timestamp::new(1_700_000_000, 1)),
        "warehouse" => document! {
            "shelves" => array![
                document! { "row" => 1, "items" => array!["bolt", "nut"] },
                document! { "row" => 2, "items" => array![] },
            ],
        },
    }
}

#[test]
fn a_stored_entry_survives_the_wire() {
    let registry = Registry::new();
    let store = DocumentStore::new(StoreConfig {
        compact_after_ops: usize::MAX,
    });

    store
        .write("inv:1", 0, |editor| {
            let doc = inventory();
            for (field, value) in doc.iter() {
                editor.put(field.clone(), value.clone());
            }
        })
        .unwrap();
    store
        .write("inv:1", 1, |editor| {
            editor.put("name", "sprocket");
            editor.edit_document("warehouse", |warehouse| {
                warehouse.edit_array("shelves", |shelves| {
                    shelves.remove_at_index(1);
                });
            });
        })
        .unwrap();

    // Ship the delta entry and its base separately, as a peer store would
    // receive them.
    let entry = store.entry("inv:1").unwrap();
    assert!(entry.is_delta());
    let (base, _) = store.base_of("inv:1").unwrap();

    let mut entry_bytes = Vec::new();
    registry.encode_entry(&entry, &mut entry_bytes);
    let mut base_bytes = Vec::new();
    registry.encode_document(&base, &mut base_bytes);

    let decoded_entry = registry.decode_entry(&mut entry_bytes.as_slice()).unwrap();
    let decoded_base = registry
        .decode_document(&mut base_bytes.as_slice())
        .unwrap();
    assert_eq!(decoded_entry, entry);

    // The receiver reconstitutes the same view the sender had.
    let materialized = decoded_entry.materialize(Some(&decoded_base)).unwrap();
    assert_eq!(materialized, store.read("inv:1").unwrap());
    assert_eq!(materialized.get("name"), Some(&Value::String("sprocket".into())));
}

#[test]
fn literal_entries_encode_without_a_base() {
    let registry = Registry::new();
    let store = DocumentStore::default();
    store
        .write("k", 0, |editor| {
            editor.put("deep", document! { "er" => document! { "est" => array![1] } });
        })
        .unwrap();

    let entry = store.entry("k").unwrap();
    assert!(matches!(entry, Entry::Literal { .. }));

    let mut bytes = Vec::new();
    registry.encode_entry(&entry, &mut bytes);
    let decoded = registry.decode_entry(&mut bytes.as_slice()).unwrap();
    assert_eq!(decoded.materialize(None).unwrap(), store.read("k").unwrap());
}

#[cfg(feature = "json")]
mod json {
    use super::*;

    #[test]
    fn documents_survive_a_json_round_trip() {
        let doc = inventory();
        let parsed = Document::from_json_str(&doc.to_json_string()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn json_and_wire_agree_on_the_same_document() {
        let registry = Registry::new();
        let via_json = Document::from_json_str(&inventory().to_json_string()).unwrap();

        let mut bytes = Vec::new();
        registry.encode_document(&inventory(), &mut bytes);
        let via_wire = registry.decode_document(&mut bytes.as_slice()).unwrap();

        assert_eq!(via_json, via_wire);
    }
}
