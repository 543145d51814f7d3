//! Integration tests for handle resolution
//!
//! Tests the full path: Catalog → BindingFactory → handler chains → Handle

mod common;

use std::sync::Arc;
use std::thread;

use stereobind::test_utils::{MockCodec, MockFormatHandler, MockProtocolHandler};
use stereobind::{
    BindingFactory, Codec, ErrorKind, FieldSchema, FormatHandlers, Handle, Protocol, Resource,
    Role, Stereotype,
};

// ═══════════════════════════════════════════════════════════════
// Fan-out / fan-in
// ═══════════════════════════════════════════════════════════════

#[test]
fn three_sinks_resolve_to_one_multiplexed_handle() {
    let mut factory = common::factory();
    let protocol = Arc::new(MockProtocolHandler::new("counting", ["file"]));
    factory.protocol_handlers_mut().add(protocol.clone());
    factory.set_sink_stereotype("out", common::events()).unwrap();
    factory
        .add_sink_resources(
            "out",
            [
                Resource::new("/out/a.csv", "csv"),
                Resource::new("/out/b.tsv", "tsv"),
                Resource::new("s3://bucket/c.json", "json").with_protocol("s3"),
            ],
        )
        .unwrap();

    let handle = factory.resolve_sink_handle("out").unwrap();

    assert!(matches!(handle, Handle::MultiSink(_)));
    assert_eq!(handle.len(), 3);
    assert_eq!(
        handle.identifiers(),
        vec!["/out/a.csv", "/out/b.tsv", "s3://bucket/c.json"]
    );
    // "local" claims `file` first, the later handler never runs
    assert_eq!(protocol.calls(), 0);
}

#[test]
fn several_sources_resolve_to_fan_in() {
    let mut factory = common::factory();
    factory.set_source_stereotype("in", common::events()).unwrap();
    factory
        .add_source_resources(
            "in",
            [Resource::new("/in/1.csv", "csv"), Resource::new("/in/2.csv", "csv")],
        )
        .unwrap();

    let handle = factory.resolve_source_handle("in").unwrap();
    assert!(matches!(handle, Handle::MultiSource(ref m) if m.len() == 2));
}

// ═══════════════════════════════════════════════════════════════
// Error precedence
// ═══════════════════════════════════════════════════════════════

#[test]
fn missing_role_is_unbound_not_no_handler() {
    let factory = BindingFactory::new();
    let err = factory.resolve_source_handle("missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnboundRole);
}

#[test]
fn failing_protocol_handler_surfaces_as_handler_failure() {
    let mut factory = BindingFactory::new();
    factory.add_format_handler(Arc::new(MockFormatHandler::new("text", ["csv"])));
    factory.add_protocol_handler(Arc::new(MockProtocolHandler::new("broken", ["file"]).failing()));
    factory.set_source_stereotype("in", common::events()).unwrap();
    factory
        .add_source_resources("in", [Resource::new("/in.csv", "csv")])
        .unwrap();

    let err = factory.resolve_source_handle("in").unwrap_err();
    assert_eq!(err.code(), "BIND-032");
    assert!(err.to_string().contains("broken"));
}

#[test]
fn resource_without_protocol_and_no_default() {
    let mut factory = common::factory();
    let bare = Stereotype::builder("bare").build().unwrap();
    factory.set_sink_stereotype("out", bare).unwrap();
    factory
        .add_sink_resources("out", [Resource::new("/o.csv", "csv")])
        .unwrap();

    let err = factory.resolve_sink_handle("out").unwrap_err();
    assert_eq!(err.code(), "BIND-041");
}

// ═══════════════════════════════════════════════════════════════
// Hot swap
// ═══════════════════════════════════════════════════════════════

#[test]
fn replaced_resource_is_used_on_next_resolve() {
    let mut factory = common::factory();
    let old = Resource::new("/data/v1.csv", "csv");
    let new = Resource::new("s3://bucket/v2.csv", "csv").with_protocol(Protocol::from("s3"));

    factory.set_source_stereotype("in", common::events()).unwrap();
    factory.add_source_resources("in", [old.clone()]).unwrap();
    assert_eq!(
        factory.resolve_source_handle("in").unwrap().identifiers(),
        vec!["/data/v1.csv"]
    );

    assert!(factory.replace_source_resource(&old, &new));
    assert_eq!(
        factory.resolve_source_handle("in").unwrap().identifiers(),
        vec!["s3://bucket/v2.csv"]
    );
    assert_eq!(factory.source_stereotype_for(&new).unwrap().name(), "events");
    assert!(factory.source_stereotype_for(&old).is_none());
}

// ═══════════════════════════════════════════════════════════════
// Batch resolution
// ═══════════════════════════════════════════════════════════════

#[test]
fn resolve_all_sinks_by_name() {
    let mut factory = common::factory();
    for name in ["audit", "metrics"] {
        factory.set_sink_stereotype(name, common::events()).unwrap();
        factory
            .add_sink_resources(name, [Resource::new(format!("/{name}.csv"), "csv")])
            .unwrap();
    }

    let handles = factory.resolve_all_sinks().unwrap();
    assert_eq!(handles.keys().collect::<Vec<_>>(), vec!["audit", "metrics"]);
    assert!(factory.resolve_all_sources().unwrap().is_empty());

    let err = factory
        .resolve_handles(Role::Sink, ["audit", "nope"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnboundRole);
}

// ═══════════════════════════════════════════════════════════════
// Codec cache
// ═══════════════════════════════════════════════════════════════

#[test]
fn unknown_schema_codec_built_once_across_resolves() {
    let mut factory = BindingFactory::new();
    factory.add_protocol_handler(Arc::new(MockProtocolHandler::new("local", ["file"])));

    let formats = Arc::new(MockFormatHandler::new("text", ["csv"]));
    let mut handlers = FormatHandlers::new();
    handlers.add(formats.clone());

    let raw = Stereotype::builder("raw")
        .default_protocol("file")
        .fields(FieldSchema::Unknown)
        .handlers(handlers)
        .build()
        .unwrap();
    factory.set_source_stereotype("in", raw).unwrap();
    factory
        .add_source_resources("in", [Resource::new("/a.csv", "csv"), Resource::new("/b.csv", "csv")])
        .unwrap();

    factory.resolve_source_handle("in").unwrap();
    factory.resolve_source_handle("in").unwrap();

    assert_eq!(formats.calls(), 1);
}

#[test]
fn concurrent_first_access_agrees_on_one_codec() {
    let mut handlers = FormatHandlers::new();
    handlers.add(Arc::new(MockFormatHandler::new("text", ["csv"])));

    let stereotype = Arc::new(
        Stereotype::builder("raw")
            .default_protocol("file")
            .handlers(handlers)
            .build()
            .unwrap(),
    );

    let codecs: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let stereotype = Arc::clone(&stereotype);
                scope.spawn(move || {
                    stereotype
                        .get_codec_for(None, &"csv".into())
                        .unwrap()
                        .unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let first = stereotype.get_codec_for(None, &"csv".into()).unwrap().unwrap();
    assert!(codecs.iter().all(|c| Arc::ptr_eq(c, &first)));
}

#[test]
fn static_codec_shadows_handlers() {
    let formats = Arc::new(MockFormatHandler::new("text", ["csv"]));
    let local = Arc::new(MockProtocolHandler::new("local", ["file"]));
    let mut factory = BindingFactory::new();
    factory.add_format_handler(formats.clone());
    factory.add_protocol_handler(local.clone());

    let static_codec: Arc<dyn Codec> = Arc::new(
        MockCodec::new(FieldSchema::typed([("id", "int"), ("ts", "long")])).with_origin("static"),
    );
    let events = Arc::new(common::events());
    events
        .add_codec_for(Some(&Protocol::from("file")), "csv", Arc::clone(&static_codec))
        .unwrap();

    factory.set_sink_stereotype("out", Arc::clone(&events)).unwrap();
    factory
        .add_sink_resources("out", [Resource::new("/o.csv", "csv")])
        .unwrap();

    factory.resolve_sink_handle("out").unwrap();

    let received = local.received_codecs();
    assert_eq!(received.len(), 1);
    assert!(Arc::ptr_eq(&received[0], &static_codec));
    assert_eq!(formats.calls(), 0);
    assert_eq!(events.binding_points().len(), 1);
}
