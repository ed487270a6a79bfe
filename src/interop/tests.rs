//! Interop tests against a live interpreter

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyModule, PyTuple};

use super::*;
use crate::config::LoaderConfig;
use crate::core::{HostValue, Integer};
use crate::errors::{DecodeError, EncodeError, LoadStage};

fn round_trip(value: &HostValue) -> HostValue {
    Python::with_gil(|py| {
        let obj = encode(py, value).unwrap();
        decode(&obj).unwrap()
    })
}

fn fixture<'py>(py: Python<'py>, name: &str, code: &str) -> Bound<'py, PyModule> {
    PyModule::from_code_bound(py, code, &format!("{}.py", name), name).unwrap()
}

#[test]
fn test_scalar_round_trip_all_widths() {
    let values = [
        HostValue::from(-8i8),
        HostValue::from(i16::MIN),
        HostValue::from(i32::MAX),
        HostValue::from(i64::MIN),
        HostValue::from(u8::MAX),
        HostValue::from(u16::MAX),
        HostValue::from(u32::MAX),
        HostValue::from(i64::MAX as u64),
        HostValue::from(3.14f32),
        HostValue::from(-2.5f64),
        HostValue::from(true),
        HostValue::from(false),
        HostValue::Null,
    ];

    for value in &values {
        assert_eq!(round_trip(value), value.normalized(), "round trip of {:?}", value);
    }
}

#[test]
fn test_u64_above_i64_fails_decode() {
    Python::with_gil(|py| {
        let obj = encode(py, &HostValue::from(u64::MAX)).unwrap();
        assert_eq!(ForeignKind::of(&obj), ForeignKind::Int);
        assert_eq!(decode(&obj).unwrap_err(), DecodeError::IntOverflow);
    });
}

#[test]
fn test_text_and_bytes_keep_embedded_zeros() {
    let text = HostValue::text("Hello\0World");
    assert_eq!(round_trip(&text), text);

    let accented = HostValue::text("héllo");
    assert_eq!(round_trip(&accented), accented);

    let bytes = HostValue::bytes(vec![0u8, 1, 2, 0]);
    assert_eq!(round_trip(&bytes), bytes);
}

#[test]
fn test_nested_containers_round_trip() {
    let value = HostValue::mapping([
        (
            HostValue::from("key1"),
            HostValue::sequence([
                HostValue::from(1i64),
                HostValue::sequence([HostValue::sequence([HostValue::from("deep")])]),
            ]),
        ),
        (HostValue::from(2i64), HostValue::Null),
        (HostValue::from("bytes"), HostValue::bytes("World")),
    ]);
    assert_eq!(round_trip(&value), value);

    let seq = HostValue::sequence([HostValue::from(1i64), HostValue::from("a"), HostValue::Null]);
    assert_eq!(round_trip(&seq), seq);
}

#[test]
fn test_set_round_trip_ignores_order() {
    let set = HostValue::set([4i64, 3, 2, 1]);
    assert_eq!(round_trip(&set), set);
}

#[test]
fn test_tuple_decodes_as_sequence() {
    Python::with_gil(|py| {
        let obj = py.eval_bound("(1, 'a', None)", None, None).unwrap();
        assert_eq!(
            decode(&obj).unwrap(),
            HostValue::sequence([HostValue::from(1i64), HostValue::from("a"), HostValue::Null])
        );
    });
}

#[test]
fn test_singletons_are_shared() {
    Python::with_gil(|py| {
        let t = encode(py, &HostValue::Bool(true)).unwrap();
        assert!(t.is(&PyBool::new_bound(py, true).to_owned()));

        let none = encode(py, &HostValue::Null).unwrap();
        assert!(none.is_none());
        assert_eq!(ForeignKind::of(&none), ForeignKind::NoneType);
    });
}

#[test]
fn test_kind_agrees_with_type_repr() {
    Python::with_gil(|py| {
        let module = fixture(py, "pyhost_kind_fixture", "class Sub(int):\n    pass\n");
        let sub = module.getattr("Sub").unwrap().call1((3,)).unwrap();

        let samples = [
            "1", "1.5", "True", "'s'", "b'b'", "[1]", "(1,)", "{1: 2}", "{1}", "None", "object()",
        ];
        for code in samples {
            let obj = py.eval_bound(code, None, None).unwrap();
            assert_eq!(
                ForeignKind::of(&obj),
                ForeignKind::from_type_repr(&type_repr(&obj)),
                "kind of {}",
                code
            );
        }

        assert_eq!(ForeignKind::of(&sub), ForeignKind::Other);
        assert_eq!(ForeignKind::from_type_repr("<class 'bool'>"), ForeignKind::Bool);
        assert_eq!(ForeignKind::from_type_repr("garbage"), ForeignKind::Other);
    });
}

#[test]
fn test_subclass_and_frozenset_decode_opaque() {
    Python::with_gil(|py| {
        let module = fixture(py, "pyhost_opaque_fixture", "class Sub(str):\n    pass\n");
        let sub = module.getattr("Sub").unwrap().call1(("x",)).unwrap();
        assert!(matches!(decode(&sub).unwrap(), HostValue::Opaque(_)));

        let frozen = py.eval_bound("frozenset({1})", None, None).unwrap();
        assert!(matches!(decode(&frozen).unwrap(), HostValue::Opaque(_)));
    });
}

#[test]
fn test_opaque_decode_retains_and_encode_returns_same_object() {
    Python::with_gil(|py| {
        let obj = py.eval_bound("object()", None, None).unwrap();
        let before = obj.get_refcnt();

        let value = decode(&obj).unwrap();
        assert_eq!(obj.get_refcnt(), before + 1);

        let encoded = encode(py, &value).unwrap();
        assert!(encoded.is(&obj));
        drop(encoded);
        drop(value);
        assert_eq!(obj.get_refcnt(), before);
    });
}

#[test]
fn test_encode_args_adopts_into_slots() {
    Python::with_gil(|py| {
        let obj = py.eval_bound("object()", None, None).unwrap();
        let before = obj.get_refcnt();

        let args = vec![
            HostValue::from(777i32),
            HostValue::Opaque(ForeignObject::retain(&obj)),
            HostValue::bytes("World"),
        ];
        assert_eq!(obj.get_refcnt(), before + 1);

        let tuple = encode_args(py, &args, CodecLimits::default()).unwrap();
        assert_eq!(tuple.len(), 3);
        assert!(tuple.get_item(1).unwrap().is(&obj));
        // host value and tuple slot each own one
        assert_eq!(obj.get_refcnt(), before + 2);

        drop(tuple);
        drop(args);
        assert_eq!(obj.get_refcnt(), before);
    });
}

#[test]
fn test_encode_args_empty() {
    Python::with_gil(|py| {
        let tuple = encode_args(py, &[], CodecLimits::default()).unwrap();
        assert!(tuple.is_empty());
    });
}

#[test]
fn test_failed_encode_releases_partial_arguments() {
    Python::with_gil(|py| {
        let obj = py.eval_bound("object()", None, None).unwrap();
        let before = obj.get_refcnt();
        let unhashable = HostValue::mapping([(HostValue::sequence([1i64]), HostValue::Null)]);

        let args = vec![HostValue::Opaque(ForeignObject::retain(&obj)), unhashable];
        let err = encode_args(py, &args, CodecLimits::default()).unwrap_err();
        assert_eq!(err, EncodeError::Unsupported { shape: "unhashable dict key (list)".into() });

        drop(args);
        assert_eq!(obj.get_refcnt(), before);
    });
}

#[test]
fn test_unhashable_set_member() {
    Python::with_gil(|py| {
        let value = HostValue::set([HostValue::mapping(Vec::<(HostValue, HostValue)>::new())]);
        let err = encode(py, &value).unwrap_err();
        assert!(matches!(err, EncodeError::Unsupported { .. }));
    });
}

#[test]
fn test_depth_limit() {
    let mut value = HostValue::from(1i64);
    for _ in 0..5 {
        value = HostValue::Sequence(vec![value]);
    }

    Python::with_gil(|py| {
        let tight = CodecLimits::new(3);
        assert_eq!(
            encode_with(py, &value, tight).unwrap_err(),
            EncodeError::DepthExceeded { limit: 3 }
        );

        let obj = encode(py, &value).unwrap();
        assert_eq!(decode_with(&obj, tight).unwrap_err(), DecodeError::DepthExceeded { limit: 3 });
        assert_eq!(decode(&obj).unwrap(), value);
    });
}

#[test]
fn test_invoke_reports_exception() {
    Python::with_gil(|py| {
        let module = fixture(py, "pyhost_invoke_fixture", "def boom():\n    raise ValueError('bad input')\n");
        let boom = module.getattr("boom").unwrap();
        let err = invoke(&boom, &PyTuple::empty_bound(py)).unwrap_err();
        assert!(err.is_instance_of::<pyo3::exceptions::PyValueError>(py));
        assert!(err.to_string().contains("bad input"));
    });
}

#[test]
fn test_registry_insert_replaces() {
    Python::with_gil(|py| {
        let a = py.eval_bound("object()", None, None).unwrap();
        let b = py.eval_bound("object()", None, None).unwrap();
        let a_before = a.get_refcnt();

        let mut registry = FunctionRegistry::new();
        assert!(registry.insert("f", ForeignObject::retain(&a)).is_none());
        assert_eq!(a.get_refcnt(), a_before + 1);

        let previous = registry.insert("f", ForeignObject::retain(&b)).unwrap();
        assert!(previous.bind(py).is(&a));
        previous.release(py);
        assert_eq!(a.get_refcnt(), a_before);

        assert!(registry.get("f").unwrap().bind(py).is(&b));
        assert_eq!(registry.names(), vec!["f"]);
        assert_eq!(registry.clear(py), 1);
        assert!(registry.is_empty());
    });
}

#[test]
fn test_loader_registers_public_attributes() {
    Python::with_gil(|py| {
        fixture(
            py,
            "pyhost_loader_fixture",
            "def f():\n    return 1\n\n_hidden = 2\nvalue = 3\n",
        );

        let config = LoaderConfig::default();
        let mut registry = FunctionRegistry::new();
        let count = ModuleLoader::new(&config)
            .load(py, "pyhost_loader_fixture", &mut registry)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(registry.names(), vec!["f", "value"]);

        let config = LoaderConfig { callables_only: true, ..LoaderConfig::default() };
        let mut registry = FunctionRegistry::new();
        ModuleLoader::new(&config)
            .load(py, "pyhost_loader_fixture", &mut registry)
            .unwrap();
        assert_eq!(registry.names(), vec!["f"]);
        registry.clear(py);
    });
}

#[test]
fn test_loader_private_names_when_not_skipped() {
    let config = LoaderConfig { skip_private: false, ..LoaderConfig::default() };
    let loader = ModuleLoader::new(&config);
    assert!(loader.is_exposed("_hidden"));

    let config = LoaderConfig::default();
    assert!(!ModuleLoader::new(&config).is_exposed("_hidden"));
    assert!(ModuleLoader::new(&config).is_exposed("visible"));
}

#[test]
fn test_import_errors_carry_stage() {
    Python::with_gil(|py| {
        let err = ModuleHandle::import(py, "").err().unwrap();
        assert_eq!(err.stage, LoadStage::EncodeName);

        let err = ModuleHandle::import(py, "bad\0name").err().unwrap();
        assert_eq!(err.stage, LoadStage::EncodeName);

        let err = ModuleHandle::import(py, "pyhost_no_such_module").err().unwrap();
        assert_eq!(err.stage, LoadStage::Import);
        assert!(err.detail.unwrap().contains("ModuleNotFoundError"));
    });
}

#[test]
fn test_dispatcher_pipeline() {
    Python::with_gil(|py| {
        fixture(
            py,
            "pyhost_dispatch_fixture",
            "def first(*args):\n    return args[0]\n\ndef big():\n    return 2 ** 80\n",
        );
        let config = LoaderConfig::default();
        let mut registry = FunctionRegistry::new();
        ModuleLoader::new(&config)
            .load(py, "pyhost_dispatch_fixture", &mut registry)
            .unwrap();

        let dispatcher = Dispatcher::default();
        let args = [HostValue::from(6.5), HostValue::from(10i64)];
        assert_eq!(dispatcher.call(py, &registry, "first", &args).unwrap(), HostValue::from(6.5));

        let err = dispatcher.call(py, &registry, "missing_fn", &[]).unwrap_err();
        assert!(err.is_not_found());

        let err = dispatcher.call(py, &registry, "first", &[]).unwrap_err();
        assert_eq!(err.stage(), "invoke");

        let err = dispatcher.call(py, &registry, "big", &[]).unwrap_err();
        assert_eq!(err.stage(), "decode");

        registry.clear(py);
    });
}

#[test]
fn test_integer_variant_after_decode() {
    assert_eq!(round_trip(&HostValue::from(5u8)), HostValue::Int(Integer::I64(5)));
}
