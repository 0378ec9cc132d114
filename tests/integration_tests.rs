use chrono::{NaiveDate, TimeZone, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use serde_tabtree::{
    from_path, from_reader, from_str, from_tree, to_path, to_string, to_tree, to_writer,
    to_writer_with_options, Error, Options, Persisted, Tree,
};
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
    note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Status {
    Pending,
    Shipped { carrier: String, tracking: u64 },
    Cancelled(String),
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

fn order() -> Order {
    Order {
        order_id: 1001,
        customer: alice(),
        items: vec![
            Product {
                sku: "A-1".to_string(),
                price: 9.99,
                quantity: 2,
            },
            Product {
                sku: "B-2".to_string(),
                price: 14.5,
                quantity: 1,
            },
        ],
        total: 34.48,
        note: None,
    }
}

#[test]
fn test_simple_struct() {
    let user = alice();
    let text = to_string(&user).unwrap();
    assert_eq!(
        text,
        "=\n\tid = 123\n\tname = Alice\n\tactive = true\n\ttags =\n\t\t= admin\n\t\t= developer\n"
    );

    let user_back: User = from_str(&text).unwrap();
    assert_eq!(user, user_back);
}

#[test]
fn test_nested_struct() {
    let order = order();
    let text = to_string(&order).unwrap();
    let order_back: Order = from_str(&text).unwrap();
    assert_eq!(order, order_back);

    let tree = Tree::parse(&text).unwrap();
    let root = tree.root();
    let name: String = tree.read_attr(root, "customer/name").unwrap();
    assert_eq!(name, "Alice");

    let items = tree.inner_node_by_key_path(root, "items").unwrap();
    assert_eq!(tree.child_count(items), 2);
    let second = tree.child(items, 1).unwrap();
    let quantity: u32 = tree.read_attr(second, "quantity").unwrap();
    assert_eq!(quantity, 1);
}

#[test]
fn test_enum_variants() {
    let statuses = vec![
        Status::Pending,
        Status::Shipped {
            carrier: "post".to_string(),
            tracking: 77,
        },
        Status::Cancelled("out of stock".to_string()),
    ];

    let text = to_string(&statuses).unwrap();
    assert_eq!(
        text,
        "=\n\t= Pending\n\t=\n\t\tShipped =\n\t\t\tcarrier = post\n\t\t\ttracking = 77\n\t=\n\t\tCancelled = out of stock\n"
    );
    let back: Vec<Status> = from_str(&text).unwrap();
    assert_eq!(back, statuses);
}

#[test]
fn test_maps() {
    let mut scores = HashMap::new();
    scores.insert("bob".to_string(), 3i64);
    scores.insert("amy".to_string(), 5);
    scores.insert("cid".to_string(), 1);

    let text = to_string(&scores).unwrap();
    assert_eq!(text, "=\n\tamy = 5\n\tbob = 3\n\tcid = 1\n");

    let back: HashMap<String, i64> = from_str(&text).unwrap();
    assert_eq!(back, scores);

    let mut by_id = BTreeMap::new();
    by_id.insert(7u32, "seven".to_string());
    by_id.insert(3u32, "three".to_string());
    let back: BTreeMap<u32, String> = from_str(&to_string(&by_id).unwrap()).unwrap();
    assert_eq!(back, by_id);
}

#[test]
fn test_lenient_unknown_children() {
    let text = "user\n\tid = 1\n\tname = Bob\n\tactive = false\n\tlegacy = yes\n\t\tdeep = 1\n\ttags =\n";
    let user: User = from_str(text).unwrap();
    assert_eq!(
        user,
        User {
            id: 1,
            name: "Bob".to_string(),
            active: false,
            tags: vec![],
        }
    );
}

#[test]
fn test_missing_field_is_an_error() {
    let err = from_str::<User>("user\n\tid = 1\n").unwrap_err();
    assert!(err.to_string().contains("missing field"));
}

#[test]
fn test_default_fields() {
    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(default)]
    struct Config {
        host: String,
        port: u16,
    }

    impl Default for Config {
        fn default() -> Self {
            Config {
                host: "localhost".to_string(),
                port: 80,
            }
        }
    }

    let config: Config = from_str("config\n\tport = 8080\n").unwrap();
    assert_eq!(
        config,
        Config {
            host: "localhost".to_string(),
            port: 8080
        }
    );
}

#[test]
fn test_scalar_conversion_error() {
    let err = from_str::<User>("user\n\tid = many\n\tname = x\n\tactive = true\n\ttags\n").unwrap_err();
    match err {
        Error::Scalar {
            value, expected, ..
        } => {
            assert_eq!(value, "many");
            assert_eq!(expected, "u32");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_persisted_scalars() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Ledger {
        created: Persisted<chrono::DateTime<Utc>>,
        closing: Persisted<NaiveDate>,
        #[serde(with = "serde_tabtree::persist")]
        balance: BigInt,
    }

    let ledger = Ledger {
        created: Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap().into(),
        closing: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap().into(),
        balance: "100000000000000000000000".parse().unwrap(),
    };

    let text = to_string(&ledger).unwrap();
    assert_eq!(
        text,
        "=\n\tcreated = 2022-03-04T05:06:07+00:00\n\tclosing = 2022-12-31\n\tbalance = 100000000000000000000000\n"
    );
    let back: Ledger = from_str(&text).unwrap();
    assert_eq!(back, ledger);
}

#[test]
fn test_tree_level_mapping() {
    let mut tree = Tree::parse("config\n\tname = demo\n").unwrap();
    let root = tree.root();
    tree.write_attr(root, "owner", &alice()).unwrap();
    tree.write_attr(root, "limits/max", &10u8).unwrap();

    let owner: User = tree.read_attr(root, "owner").unwrap();
    assert_eq!(owner, alice());
    assert_eq!(tree.read_attr::<u8>(root, "limits/max").unwrap(), 10);
    assert_eq!(tree.read_attr::<&str>(root, "name").unwrap(), "demo");

    assert_eq!(
        tree.inner_key_paths(root, true, true),
        vec![
            "name",
            "owner/id",
            "owner/name",
            "owner/active",
            "limits/max",
        ]
    );

    let copy = to_tree(&alice()).unwrap();
    let back: User = from_tree(&copy).unwrap();
    assert_eq!(back, alice());
}

#[test]
fn test_writer_and_reader() {
    let order = order();

    let mut plain = Vec::new();
    to_writer(&mut plain, &order).unwrap();
    assert_eq!(from_reader::<_, Order>(plain.as_slice()).unwrap(), order);

    let mut compressed = Vec::new();
    to_writer_with_options(&mut compressed, &order, &Options::compressed().with_level(9))
        .unwrap();
    assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    assert_eq!(from_reader::<_, Order>(compressed.as_slice()).unwrap(), order);
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("order.tt");
    let packed = dir.path().join("order.tt.gz");
    let order = order();

    to_path(&plain, &order, &Options::default()).unwrap();
    to_path(&packed, &order, &Options::compressed()).unwrap();

    let text = std::fs::read_to_string(&plain).unwrap();
    assert!(text.starts_with("=\n\torder_id = 1001\n"));
    assert_eq!(from_path::<_, Order>(&plain).unwrap(), order);
    assert_eq!(from_path::<_, Order>(&packed).unwrap(), order);

    let tree = Tree::from_path(&packed).unwrap();
    tree.save(&plain, &Options::default()).unwrap();
    assert_eq!(std::fs::read_to_string(&plain).unwrap(), text);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Tree::from_path(dir.path().join("absent.tt")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_debug_mode_parses_with_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let options = Options::new().with_debug(true);
        let tree =
            Tree::from_reader_with_options("root\n\ta = 1\n\tb = 2\n".as_bytes(), &options)
                .unwrap();
        assert_eq!(tree.child_count(tree.root()), 2);
    });
}
