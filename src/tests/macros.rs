use pretty_assertions::assert_eq;

use crate::{bson, doc, oid::ObjectId, spec::BinarySubtype, Binary, Bson, Regex, Timestamp};

#[test]
fn standard_format() {
    let id = ObjectId::from_bytes(*b"thisismyname");
    let doc = doc! {
        "float": 2.4,
        "string": "hello",
        "array": ["testing", 1, true, [1, 2]],
        "doc": {
            "fish": "in",
            "a": "barrel",
            "!": 1,
        },
        "bool": true,
        "null": null,
        "regexp": Regex::new("s[ao]d", "i"),
        "with_wrapped_parens": (-20),
        "code": Bson::JavaScriptCode("function(x) { return x._id; }".to_owned()),
        "i32": 12,
        "i64": -55i64,
        "timestamp": Timestamp { time: 0, increment: 229_999_444 },
        "binary": Binary { subtype: BinarySubtype::Md5, bytes: b"thingies".to_vec() },
        "_id": id,
    };

    let expected = format!(
        "{{ \"float\": 2.4, \"string\": \"hello\", \"array\": [\"testing\", 1, true, [1, 2]], \
         \"doc\": {{ \"fish\": \"in\", \"a\": \"barrel\", \"!\": 1 }}, \"bool\": true, \"null\": \
         null, \"regexp\": /s[ao]d/i, \"with_wrapped_parens\": -20, \"code\": function(x) {{ \
         return x._id; }}, \"i32\": 12, \"i64\": -55, \"timestamp\": Timestamp(0, 229999444), \
         \"binary\": Binary(0x5, dGhpbmdpZXM=), \"_id\": ObjectId(\"{}\") }}",
        id.to_hex()
    );
    assert_eq!(expected, format!("{doc}"));
}

#[test]
fn values() {
    assert_eq!(bson!(null), Bson::Null);
    assert_eq!(bson!([]), Bson::Array(Vec::new()));
    assert_eq!(bson!({}), Bson::Document(doc! {}));
    assert_eq!(bson!(1), Bson::Int32(1));
    assert_eq!(bson!(Some("x")), Bson::String("x".into()));
    assert_eq!(bson!(None::<i32>), Bson::Null);
    assert_eq!(
        bson!([1, null, { "a": [] }]),
        Bson::Array(vec![
            Bson::Int32(1),
            Bson::Null,
            Bson::Document(doc! { "a": Bson::Array(vec![]) }),
        ])
    );
}

#[test]
fn computed_keys() {
    let key = "dynamic";
    let doc = doc! { (key): 1, (format!("{key}_2")): 2 };
    assert_eq!(doc.get_i32("dynamic").unwrap(), 1);
    assert_eq!(doc.get_i32("dynamic_2").unwrap(), 2);
}
