//! Context dumps of derived structs.

#![cfg(feature = "derive")]

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use reportkit::{Describe, dump::dump};

#[derive(Describe)]
struct Address {
    #[describe(rename = "City")]
    pub city: String,
    #[describe(rename = "Zip")]
    pub zip: Option<u32>,
}

#[derive(Describe)]
struct Request {
    pub method: &'static str,
    pub received: NaiveDateTime,
    pub address: Address,
    pub billing: Option<Address>,
    pub tags: Vec<&'static str>,
    pub headers: BTreeMap<&'static str, &'static str>,
    #[describe(skip)]
    pub body: Vec<u8>,
    #[describe(debug)]
    pub referrer: Option<&'static str>,
    session_token: &'static str,
}

fn request() -> Request {
    Request {
        method: "POST",
        received: NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(14, 3, 11)
            .unwrap(),
        address: Address {
            city: "Oslo".to_string(),
            zip: None,
        },
        billing: None,
        tags: vec!["beta", "eu"],
        headers: BTreeMap::from([("accept", "json"), ("host", "shop")]),
        body: b"{}".to_vec(),
        referrer: Some("ads"),
        session_token: "secret",
    }
}

#[test]
fn test_derived_dump() {
    let request = request();
    assert_eq!(request.session_token, "secret");

    let expected = "\
method = POST
received: 2026-10-18 14:03:11
address:
\tCity = Oslo
\tZip = nil

billing = nil
tags = [beta eu]
headers = map[accept:json host:shop]
referrer = Some(\"ads\")

";
    assert_eq!(dump(&request, ""), expected);
}

#[test]
fn test_private_and_skipped_fields_are_omitted() {
    let rendered = dump(&request(), "");
    assert!(!rendered.contains("session_token"));
    assert!(!rendered.contains("secret"));
    assert!(!rendered.contains("body"));
}

#[derive(Describe)]
struct Pair(pub u32, pub Option<u32>, u32);

#[derive(Describe)]
struct Wrapper<T> {
    pub inner: T,
}

#[test]
fn test_tuple_and_generic_structs() {
    assert_eq!(dump(&Pair(1, None, 3), ""), "0 = 1\n1 = nil\n\n");

    let wrapped = Wrapper {
        inner: Address {
            city: "Bergen".to_string(),
            zip: Some(5003),
        },
    };
    assert_eq!(
        dump(&wrapped, ""),
        "inner:\n\tCity = Bergen\n\tZip = 5003\n\n\n"
    );
}

#[test]
fn test_nested_struct_in_sequence_renders_inline() {
    #[derive(Describe)]
    struct Batch {
        pub items: Vec<Address>,
    }

    let batch = Batch {
        items: vec![
            Address {
                city: "Oslo".to_string(),
                zip: Some(150),
            },
            Address {
                city: "Bergen".to_string(),
                zip: None,
            },
        ],
    };
    assert_eq!(dump(&batch, ""), "items = [{Oslo 150} {Bergen nil}]\n\n");
}

mod through_prelude {
    use reportkit::prelude::*;

    #[derive(Describe)]
    struct Checkout {
        pub cart_id: u64,
        pub coupon: Option<String>,
    }

    #[test]
    fn test_prelude_brings_derive_and_trait() {
        let checkout = Checkout {
            cart_id: 9,
            coupon: None,
        };
        assert_eq!(
            reportkit::dump::dump(&checkout, ""),
            "cart_id = 9\ncoupon = nil\n\n"
        );

        let boxed: Box<dyn Dump> = Box::new(checkout);
        assert_eq!(reportkit::dump::dump(&boxed, ""), "cart_id = 9\ncoupon = nil\n\n");
    }
}
